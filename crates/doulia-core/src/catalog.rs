//! The fixed service catalogue and firm contact details.

use crate::language::Language;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub id: &'static str,
    pub icon: &'static str,
    pub title_fr: &'static str,
    pub description_fr: &'static str,
    pub title_en: &'static str,
    pub description_en: &'static str,
}

impl Service {
    pub fn title(&self, language: Language) -> &'static str {
        language.pick(self.title_fr, self.title_en)
    }

    pub fn description(&self, language: Language) -> &'static str {
        language.pick(self.description_fr, self.description_en)
    }
}

pub const SERVICES: &[Service] = &[
    Service {
        id: "audit",
        icon: "⚙",
        title_fr: "Audit de Conformité Instantané",
        description_fr: "Réduction des rejets de 85% grâce à une analyse rapide et précise de la conformité de vos dossiers de marchés publics.",
        title_en: "Instant Compliance Audit",
        description_en: "85% rejection reduction through rapid and precise analysis of your public procurement file compliance.",
    },
    Service {
        id: "pricing",
        icon: "📈",
        title_fr: "Pricing Prédictif",
        description_fr: "Maximisation des marges et succès aux appels d'offres grâce à des stratégies de prix basées sur des analyses de données avancées.",
        title_en: "Predictive Pricing",
        description_en: "Maximizing margins and tender success through advanced data-driven pricing strategies.",
    },
    Service {
        id: "veille",
        icon: "🔔",
        title_fr: "Veille Stratégique",
        description_fr: "Alertes en temps réel sur les marchés ARMP et opportunités stratégiques, vous assurant de ne jamais manquer un appel d'offres pertinent.",
        title_en: "Strategic Monitoring",
        description_en: "Real-time alerts on ARMP markets and strategic opportunities, ensuring you never miss a relevant tender.",
    },
    Service {
        id: "redaction",
        icon: "📄",
        title_fr: "Assistant de Rédaction",
        description_fr: "Rédaction de mémoires techniques de haut niveau, clairs, concis et convaincants pour optimiser vos chances de succès.",
        title_en: "Drafting Assistant",
        description_en: "Drafting high-level technical briefs that are clear, concise, and compelling to optimize your chances of success.",
    },
];

pub fn find_service(id: &str) -> Option<&'static Service> {
    SERVICES.iter().find(|service| service.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactInfo {
    pub location: &'static str,
    pub phones: &'static [&'static str],
    pub email: &'static str,
}

pub const CONTACT_INFO: ContactInfo = ContactInfo {
    location: "Yaoundé, Cameroun (BP 33823)",
    phones: &["(+237) 699 91 99 72", "(+237) 679 528 876"],
    email: "jmlobe@outlook.com",
};

/// The message sent on the user's behalf when a service card is selected.
pub fn opening_prompt(service: &Service, language: Language) -> String {
    let fr = service.title_fr;
    let en = service.title_en;

    match (service.id, language) {
        ("audit", Language::Fr) => format!(
            "Je vois que vous êtes intéressé par l'**{fr}**. Pour commencer, **souhaitez-vous télécharger un Dossier d'Appel d'Offres (DAO) ou me décrire votre besoin spécifique ?** Je vous expliquerai ensuite comment cet outil réduit les rejets de 85%."
        ),
        ("audit", Language::En) => format!(
            "I see you are interested in **{en}**. To get started, **would you like to upload a Tender Document (DAO) or describe your specific needs?** I'll then explain how this tool reduces rejections by 85%."
        ),
        ("pricing", Language::Fr) => format!(
            "Je vois que vous êtes intéressé par le **{fr}**. Pour **maximiser vos marges et votre succès**, **souhaitez-vous que j'analyse des données de marché ou que j'applique des formules de calcul de compétitivité pour un projet spécifique ?**"
        ),
        ("pricing", Language::En) => format!(
            "I see you are interested in **{en}**. To **maximize your margins and success**, **would you like me to analyze market data or apply competitiveness formulas for a specific project?**"
        ),
        ("veille", Language::Fr) => format!(
            "Excellent choix ! Le service de **{fr}** vous tiendra informé. **Quel type de marchés ARMP vous intéresse le plus ou avez-vous des critères spécifiques à surveiller ?** Je peux configurer vos alertes en temps réel."
        ),
        ("veille", Language::En) => format!(
            "Excellent choice! Our **{en}** service will keep you informed. **What type of ARMP markets are you most interested in, or do you have specific criteria to monitor?** I can set up your real-time alerts."
        ),
        ("redaction", Language::Fr) => format!(
            "Parfait ! L'**{fr}** est là pour vous. **Sur quel type de mémoire technique travaillez-vous, ou avez-vous besoin d'aide pour structurer des arguments complexes ?** Je suis prêt à vous assister dans la rédaction de documents de haut niveau."
        ),
        ("redaction", Language::En) => format!(
            "Perfect! The **{en}** is here to help. **What type of technical brief are you working on, or do you need assistance structuring complex arguments?** I'm ready to assist you in drafting high-level documents."
        ),
        (_, Language::Fr) => format!(
            "Je vois que vous êtes intéressé par l'{fr}. Souhaitez-vous que je vous explique comment nous avons aidé nos derniers clients avec cet outil ?"
        ),
        (_, Language::En) => format!(
            "I see you are interested in '{en}'. Would you like me to explain how we have helped our latest clients with this tool?"
        ),
    }
}
