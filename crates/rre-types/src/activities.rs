use serde::{Deserialize, Serialize};

/// A business-sector tag a registrant self-selects from the fixed catalog.
/// The label/category pair is denormalized onto the registration at attach
/// time, so the owned form is what circulates through the rest of the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityOption {
    pub id: String,
    pub label: String,
    pub category: String,
}

/// The catalog itself, as (id, label, category) triples.
const CATALOG: &[(&str, &str, &str)] = &[
    // Exportateurs
    ("exportateurs-directs", "Exportateurs directs (%exportations)", "Exportateurs"),
    ("exportateurs-indirects", "Exportateurs indirects", "Exportateurs"),
    ("marche-local", "Marche local", "Exportateurs"),
    ("marque-marocaine", "Marque marocaine", "Exportateurs"),
    // Production
    ("produit-fini", "Produit fini", "Production"),
    ("sous-traitance", "Sous-traitance", "Production"),
    ("co-traitance", "Co-traitance", "Production"),
    // Textile
    ("textile", "Textile", "Textile"),
    ("chaine-et-trame", "Chaîne et trame", "Textile"),
    ("maille", "Maille", "Textile"),
    ("textile-technique", "Textile technique", "Textile"),
    ("textile-de-maison", "Textile de maison", "Textile"),
    // Habillement
    ("habillement", "Habillement", "Habillement"),
    ("maille-fine", "Maille fine", "Habillement"),
    ("grosse-maille", "Grosse maille", "Habillement"),
    ("denim", "Denim", "Habillement"),
    ("flou", "Flou", "Habillement"),
    ("pieces-a-manches", "Pièces à manches", "Habillement"),
    // Finissage et teinture
    ("finissage-et-teinture", "Finissage et teinture", "Finissage"),
    ("teinture-tissus", "Teinture tissus", "Finissage"),
    ("teinture-pieces", "Teinture pièces", "Finissage"),
    ("delavage", "Délavage", "Finissage"),
    ("finissage", "Finissage", "Finissage"),
    // Impression
    ("impression-rotative", "Impression rotative", "Impression"),
    ("impression-digitale", "Impression digitale", "Impression"),
    ("personnalisation", "Personnalisation", "Impression"),
    ("broderie", "Broderie", "Impression"),
    ("serigraphie", "Sérigraphie", "Impression"),
    ("sublimation", "Sublimation", "Impression"),
    ("laser", "Laser", "Impression"),
    // Autres
    ("autres", "Autres", "Autres"),
];

/// Look up a catalog entry by id.
pub fn find_activity(id: &str) -> Option<ActivityOption> {
    CATALOG
        .iter()
        .find(|(aid, _, _)| *aid == id)
        .map(|(aid, label, category)| ActivityOption {
            id: (*aid).to_string(),
            label: (*label).to_string(),
            category: (*category).to_string(),
        })
}

/// Every catalog entry, in display order.
pub fn all_activities() -> Vec<ActivityOption> {
    CATALOG
        .iter()
        .map(|(id, label, category)| ActivityOption {
            id: (*id).to_string(),
            label: (*label).to_string(),
            category: (*category).to_string(),
        })
        .collect()
}
