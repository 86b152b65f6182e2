use doulia_core::catalog::{CONTACT_INFO, SERVICES};
use doulia_core::{i18n, Language, Message, MessagePart, Sender, TurnController};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FocusPane, InputMode, PathPurpose};
use crate::markup;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [catalogue_area, assistant_area] = Layout::horizontal([
        Constraint::Percentage(38),
        Constraint::Percentage(62),
    ])
    .areas(body_area);

    render_catalogue(app, frame, catalogue_area);
    render_assistant(app, frame, assistant_area);
    render_footer(app, frame, footer_area);

    // Popups (in order of priority)
    if app.alert.is_some() {
        render_alert(app, frame, area);
    } else if app.path_prompt.is_some() {
        render_path_prompt(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let language = app.display_language();
    let title = Line::from(vec![
        Span::styled(format!(" {} ", i18n::headline()), Style::default().fg(Color::Cyan).bold()),
        Span::styled(i18n::tagline(language), Style::default().fg(Color::White)),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", language.as_str().to_uppercase()),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_catalogue(app: &mut App, frame: &mut Frame, area: Rect) {
    let language = app.display_language();

    let [services_area, contact_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(7),
    ])
    .areas(area);
    app.services_area = Some(services_area);

    let focused = app.focus == FocusPane::Services;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let title = match language {
        Language::Fr => " Nos services ",
        Language::En => " Our services ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let description_width = services_area.width.saturating_sub(6) as usize;
    let items: Vec<ListItem> = SERVICES
        .iter()
        .map(|service| {
            let mut title_spans = vec![
                Span::raw(format!("{} ", service.icon)),
                Span::styled(service.title(language), Style::default().add_modifier(Modifier::BOLD)),
            ];
            // French mode also shows the English name
            if language == Language::Fr {
                title_spans.push(Span::styled(
                    format!("  {}", service.title_en),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                ));
            }

            let description = truncate(service.description(language), description_width);
            ListItem::new(Text::from(vec![
                Line::from(title_spans),
                Line::from(Span::styled(format!("   {}", description), Style::default().fg(Color::Gray))),
                Line::default(),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, services_area, &mut app.service_state);

    let contact = Paragraph::new(vec![
        Line::from(Span::styled(i18n::social_proof(language), Style::default().fg(Color::Green))),
        Line::from(format!("📍 {}", CONTACT_INFO.location)),
        Line::from(format!("📞 {}", CONTACT_INFO.phones.join(" / "))),
        Line::from(format!("✉  {}", CONTACT_INFO.email)),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Contact "),
    );
    frame.render_widget(contact, contact_area);
}

fn truncate(text: &str, width: usize) -> String {
    if width == 0 || text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn render_assistant(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    app.chat_area = Some(chat_area);
    // Inner size minus borders, for scroll calculations
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
}

fn render_chat(app: &App, frame: &mut Frame, area: Rect) {
    let language = app.display_language();
    let focused = app.focus == FocusPane::Chat;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let mut lines: Vec<Line> = Vec::new();
    let messages = app.controller.messages();
    // Only the newest spoken reply can be the one playing
    let playing_index = messages.iter().rposition(Message::has_playable_audio);

    for (index, message) in messages.iter().enumerate() {
        lines.push(sender_line(message.sender));
        let speaking = app.controller.is_speaking() && playing_index == Some(index);
        for part in &message.parts {
            push_part(&mut lines, part, speaking, language);
        }
        lines.push(Line::default());
    }

    if app.controller.is_sending() {
        lines.push(sender_line(Sender::Bot));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("{}{}", i18n::thinking_label(language), dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(" DOULIA "),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn sender_line(sender: Sender) -> Line<'static> {
    match sender {
        Sender::User => Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Sender::Bot => Line::from(Span::styled(
            "DOULIA:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    }
}

fn push_part(lines: &mut Vec<Line<'static>>, part: &MessagePart, speaking: bool, language: Language) {
    match part {
        MessagePart::Text { text } => lines.extend(markup::render_text(text)),
        MessagePart::Bold { text } => lines.push(Line::from(Span::styled(
            text.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))),
        MessagePart::Link { text, href } => lines.push(Line::from(vec![
            Span::styled(
                text.clone(),
                Style::default().fg(Color::LightBlue).add_modifier(Modifier::UNDERLINED),
            ),
            Span::styled(format!(" <{}>", href), Style::default().fg(Color::DarkGray)),
        ])),
        MessagePart::Error { text } => lines.push(Line::from(Span::styled(
            format!("⚠ {}", text),
            Style::default().fg(Color::Red),
        ))),
        MessagePart::Audio { .. } => {
            let (label, color) = if speaking {
                (format!("🔊 {}", i18n::speaking_label(language)), Color::Magenta)
            } else {
                ("♪ audio".to_string(), Color::DarkGray)
            };
            lines.push(Line::from(Span::styled(label, Style::default().fg(color))));
        }
        MessagePart::File { file_name, .. } => lines.push(Line::from(Span::styled(
            format!("📄 {} (PDF)", file_name),
            Style::default().fg(Color::Green),
        ))),
    }
}

/// Input bar labels follow the conversation language, not the display toggle.
fn input_title(controller: &TurnController) -> String {
    let language = controller.current_language();
    let mut title = if controller.is_recording() {
        format!(" {} ", i18n::recording_label(language))
    } else if controller.is_sending() {
        format!(" {} ", i18n::sending_label(language))
    } else if controller.is_speaking() {
        format!(" {} ", i18n::speaking_label(language))
    } else {
        format!(" {} ", i18n::send_label(language))
    };
    if let Some(file) = controller.staged_file() {
        title.push_str(&format!("📎 {} ", file.file_name));
    }
    title
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let controller = &app.controller;
    let language = controller.current_language();
    let editing = app.input_mode == InputMode::Editing;
    let title = input_title(controller);

    let border_color = if controller.is_recording() {
        Color::Magenta
    } else if editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let (content, style) = if controller.is_recording() {
        (controller.interim_text().to_string(), Style::default().fg(Color::Magenta))
    } else if app.input.is_empty() && !editing {
        (i18n::placeholder(language).to_string(), Style::default().fg(Color::DarkGray))
    } else if controller.input_enabled() {
        (app.input.clone(), Style::default())
    } else {
        (app.input.clone(), Style::default().fg(Color::DarkGray))
    };

    let input = Paragraph::new(content).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title),
    );
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (app.cursor as u16).min(area.width.saturating_sub(3));
        frame.set_cursor_position((area.x + 1 + cursor_x, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INSERT ",
    };

    let hints = match app.input_mode {
        InputMode::Normal => {
            let mut hints = String::from(" Tab focus · Enter select · i type · u upload · a attach");
            if app.controller.voice_available() {
                hints.push_str(" · v voice");
            }
            hints.push_str(" · L FR/EN · q quit");
            hints
        }
        InputMode::Editing => " Enter send · Esc done".to_string(),
    };

    let footer = Line::from(vec![
        Span::styled(mode_text, mode_style),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(footer), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn render_alert(app: &App, frame: &mut Frame, area: Rect) {
    let Some(message) = app.alert.as_deref() else {
        return;
    };
    let popup_area = centered(area, 60, 6);
    frame.render_widget(Clear, popup_area);

    let alert = Paragraph::new(vec![
        Line::from(message.to_string()),
        Line::default(),
        Line::from(Span::styled("(any key)", Style::default().fg(Color::DarkGray))),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" DOULIA "),
    );
    frame.render_widget(alert, popup_area);
}

fn render_path_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let Some(prompt) = app.path_prompt.as_ref() else {
        return;
    };
    let language = app.display_language();

    let popup_area = centered(area, 70, 7);
    frame.render_widget(Clear, popup_area);

    let title = match prompt.purpose {
        PathPurpose::Upload => i18n::upload_prompt(language),
        PathPurpose::Stage => i18n::attach_prompt(language),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" {} ", title));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("PDF · Enter OK · Esc cancel").style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    frame.render_widget(
        Paragraph::new(prompt.input.as_str()).style(Style::default().fg(Color::Cyan)),
        input_area,
    );

    let cursor_x = (prompt.cursor as u16).min(input_area.width.saturating_sub(1));
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
}
