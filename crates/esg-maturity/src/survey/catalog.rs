use super::domain::{
    ExternalCheck, QuestionDefinition, QuestionPrompt, ScoringRule, SurveySection,
};

/// Sentinel option that zeroes the nature-based solutions score.
pub const NONE_SENTINEL: &str = "None";

/// Fixed, ordered question table. Step indices are dense and start at zero; any
/// step past the end of the table is the finalization trigger.
#[derive(Debug)]
pub struct QuestionCatalog {
    questions: Vec<QuestionDefinition>,
}

impl QuestionCatalog {
    pub fn standard() -> Self {
        Self::from_definitions(standard_questions())
    }

    /// Builds a catalog, renumbering steps so they follow table order.
    pub fn from_definitions(definitions: Vec<QuestionDefinition>) -> Self {
        let questions = definitions
            .into_iter()
            .enumerate()
            .map(|(step, mut question)| {
                question.step = step;
                question
            })
            .collect();

        Self { questions }
    }

    pub fn lookup(&self, step: usize) -> Option<&QuestionDefinition> {
        self.questions.get(step)
    }

    pub fn by_field(&self, field_key: &str) -> Option<&QuestionDefinition> {
        self.questions
            .iter()
            .find(|question| question.field_key == field_key)
    }

    pub fn questions(&self) -> &[QuestionDefinition] {
        &self.questions
    }

    pub fn questions_in_section(&self, section: SurveySection) -> Vec<&QuestionDefinition> {
        self.questions
            .iter()
            .filter(|question| question.section == section)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The pseudo-step that triggers finalization.
    pub fn terminal_step(&self) -> usize {
        self.questions.len()
    }

    pub fn scored_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|question| question.is_scored())
            .count()
    }

    pub fn max_total(&self) -> u32 {
        self.questions.iter().map(QuestionDefinition::max_score).sum()
    }

    pub fn prompts(&self) -> Vec<QuestionPrompt> {
        let total = self.len();
        self.questions
            .iter()
            .map(|question| question.to_prompt(total))
            .collect()
    }
}

fn standard_questions() -> Vec<QuestionDefinition> {
    use SurveySection::*;

    vec![
        QuestionDefinition::free_text(CompanyProfile, "company_name", "What's your company name?"),
        QuestionDefinition::single_select(
            CompanyProfile,
            "region",
            "Which region best describes your primary market?",
            &[
                "North America",
                "Latin America",
                "Europe (Western)",
                "Europe (Eastern)",
                "Middle East (excl. KSA)",
                "KSA (Saudi Arabia)",
                "Africa (Sub-Saharan)",
                "Africa (North)",
                "Asia (East)",
                "Asia (South)",
                "Asia (Southeast)",
                "Central Asia",
                "Oceania",
            ],
        )
        .unscored(),
        QuestionDefinition::free_text(
            CompanyProfile,
            "major_countries",
            "Which major countries do you operate in?",
        ),
        QuestionDefinition::free_text(
            CompanyProfile,
            "sector_industry",
            "Please specify your sector & industry (e.g., Renewable Energy, Pharmaceuticals, AgriTech)",
        ),
        QuestionDefinition::single_select(
            CompanyProfile,
            "company_size",
            "What is your company size?",
            &["0 - 100", "101 - 500", "501 - 1000", "1001 - 2000", "2001 & above"],
        )
        .unscored(),
        QuestionDefinition::single_select(
            CompanyProfile,
            "listing_status",
            "Is your company listed or unlisted?",
            &["Listed", "Unlisted"],
        )
        .unscored(),
        QuestionDefinition::free_text(
            CompanyProfile,
            "total_emissions",
            "What is your total annual GHG emissions (in tCO2e)?",
        ),
        QuestionDefinition::single_select(
            StrategyAndGovernance,
            "sustainability_strategy",
            "Documented sustainability strategy:",
            &["None", "Draft", "Approved & shared", "Integrated with KPIs"],
        ),
        QuestionDefinition::single_select(
            StrategyAndGovernance,
            "governance_accountability",
            "Governance & accountability:",
            &["None", "Ad hoc owner", "Committee + owner", "Board/Exec oversight"],
        ),
        QuestionDefinition::single_select(
            StrategyAndGovernance,
            "materiality_assessment",
            "Materiality assessment:",
            &["None", "Informal", "Structured/periodic", "Aligned & strategy-driven"],
        ),
        QuestionDefinition::single_select(
            StrategyAndGovernance,
            "erm_esg",
            "ERM integration of ESG:",
            &["Not in ERM", "Parallel list", "In ERM", "Scenario-tested in ERM"],
        ),
        QuestionDefinition::single_select(
            StrategyAndGovernance,
            "incentives_performance",
            "Incentives/performance links:",
            &["None", "Informal", "Exec KPIs", "Cascaded KPIs"],
        ),
        QuestionDefinition::single_select(
            StrategyAndGovernance,
            "framework_alignment",
            "Framework alignment maturity:",
            &["None", "Awareness", "Formal (≥1)", "Multi-framework + updates"],
        ),
        QuestionDefinition::single_select(
            StrategyAndGovernance,
            "policies_monitoring",
            "Policies & monitoring:",
            &[
                "None",
                "Few/ad hoc",
                "Multi-policy + internal tracking",
                "Full E/S/G + audits",
            ],
        ),
        QuestionDefinition::single_select(
            Climate,
            "netzero_targets",
            "Net-zero/targets:",
            &[
                "None",
                "Undisclosed aims",
                "Target set (SBTi pending)",
                "SBTi-validated + milestones",
            ],
        ),
        QuestionDefinition::single_select(
            Climate,
            "scope_coverage",
            "Scope coverage:",
            &["None", "Partial S1/2", "Full S1-2", "S1-2 + material S3"],
        ),
        QuestionDefinition::single_select(
            Climate,
            "climate_disclosure",
            "Climate disclosure alignment:",
            &[
                "None",
                "Aware only",
                "Partial (e.g., CDP/TCFD pilot)",
                "Full (ISSB S2/TCFD/CDP)",
            ],
        ),
        QuestionDefinition::single_select(
            Climate,
            "decarbonization_plan",
            "Decarbonization levers in plan:",
            &["None", "Energy efficiency", "+ RE power", "+ Value-chain (S3)"],
        ),
        QuestionDefinition::single_select(
            Climate,
            "carbon_pricing",
            "Carbon pricing/use in decisions:",
            &[
                "None",
                "Shadow price explored",
                "Shadow price applied",
                "Internal price drives capex",
            ],
        ),
        QuestionDefinition::single_select(
            Climate,
            "transition_plan",
            "Transition plan detail:",
            &[
                "None",
                "Qualitative",
                "Quantified with interim KPIs",
                "Capex-linked, board-approved",
            ],
        ),
        QuestionDefinition::single_select(
            EnergyAndCircularity,
            "energy_management",
            "Energy management:",
            &[
                "No program",
                "Basic controls",
                "Targets + metering",
                "ISO/EnMS + continuous improve",
            ],
        ),
        QuestionDefinition::single_select(
            EnergyAndCircularity,
            "renewables_adoption",
            "Renewables adoption:",
            &["0–10%", "11–30%", "31–50%", ">50% or SBTi RE target"],
        ),
        QuestionDefinition::single_select(
            EnergyAndCircularity,
            "electrification_energy",
            "Electrification/decentralized energy:",
            &[
                "None",
                "Pilots",
                "Multi-site rollout",
                "Portfolio-scale (PV/HP/EV/Storage)",
            ],
        ),
        QuestionDefinition::single_select(
            EnergyAndCircularity,
            "waste_management",
            "Waste management:",
            &[
                "Legal minimum",
                "Compliance core streams",
                "Reduction & diversion targets",
                "Zero-waste/circular commitments",
            ],
        ),
        QuestionDefinition::single_select(
            EnergyAndCircularity,
            "waste_diverted",
            "Waste diverted (recycle/reuse/compost):",
            &["None / Don’t know", "<20%", "21-50%", ">50%"],
        ),
        QuestionDefinition::single_select(
            EnergyAndCircularity,
            "product_sustainability",
            "Product/service sustainability:",
            &[
                "Not considered",
                "Process tweaks",
                "LCA-informed design",
                "Circular/low-carbon portfolio",
            ],
        ),
        QuestionDefinition::single_select(
            EnergyAndCircularity,
            "biodiversity_nature",
            "Biodiversity & nature:",
            &[
                "Not considered",
                "Risks noted",
                "Policies & TNFD-aligned steps",
                "Strategy with targets & restoration",
            ],
        ),
        QuestionDefinition::single_select(
            EnergyAndCircularity,
            "green_buildings",
            "Green building certifications:",
            &["None", "EDGE", "BREEAM", "LEED"],
        ),
        QuestionDefinition::single_select(
            WaterStewardship,
            "water_measurement",
            "Water measurement (withdrawal/consumption/discharge):",
            &["None", "Partial", "Full", "Audited/externally assured"],
        ),
        QuestionDefinition::multi_select(
            WaterStewardship,
            "nature_based_solutions",
            "Nature-based solutions (check all that apply):",
            &[
                NONE_SENTINEL,
                "Rainwater",
                "Green roofs",
                "Wetlands",
            ],
            ScoringRule::SelectionCount {
                none_sentinel: Some(NONE_SENTINEL),
                cap: 3,
            },
        ),
        QuestionDefinition::single_select(
            WaterStewardship,
            "water_risk",
            "Water risk (basin stress):",
            &[
                "Not assessed",
                "Screened",
                "Integrated in plans",
                "Site-level mitigations & targets",
            ],
        ),
        QuestionDefinition::single_select(
            WaterStewardship,
            "water_efficiency",
            "Water efficiency/reuse:",
            &[
                "None",
                "KPIs set",
                "Reuse <50% or tech upgrades",
                "Reuse >50% + circular systems",
            ],
        ),
        QuestionDefinition::single_select(
            SupplyChain,
            "supplier_esg",
            "Supplier ESG expectations:",
            &[
                "None",
                "Tier-1 info",
                "Code + assessments",
                "Traceability + audits + co-innovation",
            ],
        ),
        QuestionDefinition::single_select(
            SupplyChain,
            "purchased_goods",
            "Purchased goods/services carbon:",
            &[
                "No",
                "Planning",
                "Yes (key cats)",
                "Yes (broad cats) + supplier targets",
            ],
        ),
        QuestionDefinition::single_select(
            SupplyChain,
            "sustainable_procurement",
            "Sustainable procurement:",
            &[
                "None",
                "Informal",
                "Formal policy",
                "Category-level KPIs + sourcing levers",
            ],
        ),
        QuestionDefinition::single_select(
            PeopleAndCulture,
            "esg_training",
            "ESG training:",
            &["None", "Mandatory for all", "Optional", "ESG team only"],
        ),
        QuestionDefinition::single_select(
            PeopleAndCulture,
            "staff_green",
            "Staff involved in green initiatives:",
            &["<10%", "11-30%", "31-50%", ">50%"],
        ),
        QuestionDefinition::single_select(
            DataAndReporting,
            "data_systems",
            "Data systems & dashboards:",
            &[
                "None",
                "Manual",
                "Partial dashboards",
                "Real-time/IoT + audit trail",
            ],
        ),
        QuestionDefinition::single_select(
            DataAndReporting,
            "reporting_quality",
            "Reporting breadth & quality:",
            &[
                "None",
                "Internal only",
                "Public (1+ standard)",
                "Multi-standard + assurance",
            ],
        ),
        QuestionDefinition::single_select(
            ExternalSignals,
            "ratings_certifications",
            "Ratings/certifications:",
            &[
                "None",
                "Single (pilot)",
                "Multiple",
                "High-tier + continuous improvement",
            ],
        ),
        QuestionDefinition::single_select(
            ExternalSignals,
            "green_finance",
            "Green finance readiness:",
            &[
                "None",
                "Exploring",
                "Framework drafted",
                "Active SLB/Green Capex pipeline",
            ],
        ),
        QuestionDefinition::free_text(Contact, "email", "Please provide your valid email address:")
            .with_lead_in(
                "Almost done! Just a few more details to complete your sustainability roadmap.",
            )
            .with_external_check(ExternalCheck::EmailDeliverability),
        QuestionDefinition::free_text(Contact, "Name", "Provide me your Full name"),
        QuestionDefinition::free_text(Contact, "Phone_number", "Provide us your contact No"),
    ]
}
