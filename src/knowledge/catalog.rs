use super::{ChemicalTreatment, DiseaseRecord, OrganicTreatment, Risk, RiskLevel, SymptomStage};

// New records only need to be appended here; keys derive from plant/condition.
pub(super) static RECORDS: &[DiseaseRecord] = &[STRAWBERRY_LEAF_SCORCH];

const STRAWBERRY_LEAF_SCORCH: DiseaseRecord = DiseaseRecord {
    plant: "Strawberry",
    condition: "Leaf scorch",
    pathogen: "Diplocarpon earlianum (Ellis & Everh.) F.A. Wolf",
    taxonomy: &[
        ("Kingdom", "Fungi"),
        ("Phylum", "Ascomycota"),
        ("Class", "Leotiomycetes"),
        ("Order", "Helotiales"),
        ("Family", "Dermateaceae"),
        ("Genus", "Diplocarpon"),
        ("Species", "D. earlianum"),
        ("Common Name", "Strawberry Leaf Scorch"),
    ],
    overview: "Strawberry Leaf Scorch is caused by the ascomycete fungus \
        Diplocarpon earlianum. The pathogen overwinters in infected leaf debris \
        as apothecia and initiates primary infections in spring when ascospores \
        are released during rain. Asexual conidia produced in acervuli drive \
        rapid secondary spread. Optimal conditions are 18–24°C with leaf wetness \
        periods of 6+ hours.",
    symptoms: &[
        SymptomStage {
            title: "Stage 1 — Early Infection (Days 1–7)",
            description: "Tiny (1–3 mm) irregular purple-red spots appear on the upper \
                leaf surface. Spots are scattered and commonly mistaken for insect damage.",
        },
        SymptomStage {
            title: "Stage 2 — Lesion Expansion (Days 7–14)",
            description: "Spots enlarge to 3–6 mm with dark-purple margins and tan/grey \
                necrotic centres. Lesions coalesce along leaf veins, giving a scorched \
                appearance.",
        },
        SymptomStage {
            title: "Stage 3 — Advanced Necrosis (Days 14–21)",
            description: "Large irregular blotches cover significant leaf area. Leaf edges \
                curl upward, turn brown, and dry out. Severe defoliation may begin.",
        },
        SymptomStage {
            title: "Stage 4 — Secondary Spread (Day 21+)",
            description: "Acervuli (black spore-bearing structures) visible under \
                magnification. Rain-splashed conidia infect neighbouring plants. Yield \
                significantly reduced.",
        },
    ],
    organic_treatments: &[
        OrganicTreatment {
            product: "Copper hydroxide 77% WP",
            dosage: "2.5 g / litre water",
            frequency: "Every 7–10 days during wet seasons",
        },
        OrganicTreatment {
            product: "Neem oil (3,000 ppm azadirachtin)",
            dosage: "5 ml / litre + surfactant",
            frequency: "Every 10–14 days; avoid midday",
        },
        OrganicTreatment {
            product: "Potassium bicarbonate",
            dosage: "5 g / litre water",
            frequency: "Preventative; every 7 days",
        },
        OrganicTreatment {
            product: "Bacillus subtilis (Serenade)",
            dosage: "Per label rate",
            frequency: "Every 5–7 days; compatible with copper",
        },
    ],
    chemical_treatments: &[
        ChemicalTreatment {
            active_ingredient: "Myclobutanil",
            trade_name: "Rally 40WSP",
            dosage: "0.34–0.57 g/L",
            notes: "Every 10–14 days; max 4 apps/season",
        },
        ChemicalTreatment {
            active_ingredient: "Captan",
            trade_name: "Captan 50WP",
            dosage: "2.0–3.0 g/L",
            notes: "Every 7–10 days; do not mix with oils",
        },
        ChemicalTreatment {
            active_ingredient: "Tebuconazole",
            trade_name: "Elite 45DF",
            dosage: "0.28 g/L",
            notes: "Every 14 days; FRAC Group 3",
        },
        ChemicalTreatment {
            active_ingredient: "Pyraclostrobin",
            trade_name: "Cabrio EG",
            dosage: "0.56 g/L",
            notes: "Max 2 consecutive apps; rotate groups",
        },
        ChemicalTreatment {
            active_ingredient: "Azoxystrobin",
            trade_name: "Quadris SC",
            dosage: "0.77 ml/L",
            notes: "FRAC Group 11; rotate to avoid resistance",
        },
    ],
    risks: &[
        Risk {
            label: "Infection Risk",
            level: RiskLevel::High,
            description: "Spreads rapidly via rain-splash conidia. Early isolation is critical.",
        },
        Risk {
            label: "Yield Impact",
            level: RiskLevel::High,
            description: "Severe infections reduce marketable yield by 30–70% via premature \
                defoliation.",
        },
        Risk {
            label: "Spread Mechanism",
            level: RiskLevel::Moderate,
            description: "Primary: rain splash and overhead irrigation. Secondary: tools, \
                footwear, transplants.",
        },
        Risk {
            label: "Environmental Risk",
            level: RiskLevel::Moderate,
            description: "Peak risk at 18–24°C with >6 h leaf wetness — typical of \
                spring/autumn rainy periods.",
        },
        Risk {
            label: "Resistance Risk",
            level: RiskLevel::Low,
            description: "Resistance possible with FRAC Groups 3 and 11. Rotate chemical \
                classes.",
        },
    ],
    prevention: &[
        "Use certified disease-free transplants from reputable nurseries.",
        "Select resistant cultivars (e.g., Allstar, Delite, Lateglow).",
        "Implement drip irrigation — avoid overhead watering to keep foliage dry.",
        "Maintain plant spacing ≥ 30 cm to promote airflow and reduce canopy humidity.",
        "Remove and destroy infected debris promptly; do not compost diseased material.",
        "Apply a preventative fungicide programme before disease establishment.",
        "Sanitise tools, boots, and equipment between rows and between fields.",
        "Scout weekly from early spring; act at first sign of lesions.",
        "Apply balanced fertilisation; avoid excess nitrogen which increases susceptibility.",
        "Rotate strawberry planting sites every 2–3 years.",
    ],
};
