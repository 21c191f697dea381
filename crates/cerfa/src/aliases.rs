//! External spellings of each slot
//!
//! One table serves both directions: the mapper reads upstream record keys
//! through it, and the filler uses it to recognize form field names.

use crate::Slot;

/// Accepted external keys per slot, preferred spelling first
///
/// Keys are matched exactly by the mapper, including the trailing space
/// the upstream system puts after `"Immatriculation "`.
const ALIASES: [(Slot, &[&str]); 11] = [
    (Slot::NomPrenom, &["Nom prenom", "Nom prénom", "Nom Prenom"]),
    (Slot::Adresse, &["Adresse"]),
    (Slot::CpVille, &["CP VILLE", "CP Ville", "Code postal ville"]),
    (Slot::DateNaissance, &["Date de naissance"]),
    (Slot::VilleNaissance, &["Ville de naissance"]),
    (Slot::Mail, &["Mail", "Email", "E-mail"]),
    (Slot::Telephone, &["Telephone", "Téléphone"]),
    (Slot::Immatriculation, &["Immatriculation ", "Immatriculation"]),
    (
        Slot::Date1erImmatriculation,
        &["Date 1er immatriculation", "Date 1ère immatriculation"],
    ),
    (Slot::MarqueModele, &["Marque modele", "Marque modèle"]),
    (Slot::NumeroFormule, &["Numero de formule", "Numéro de formule"]),
];

/// External keys accepted for a slot
pub fn aliases(slot: Slot) -> &'static [&'static str] {
    ALIASES
        .iter()
        .find(|(s, _)| *s == slot)
        .map(|(_, keys)| *keys)
        .unwrap_or(&[])
}

/// Every spelling a form field may use for a slot: the wire name first
pub fn field_name_candidates(slot: Slot) -> impl Iterator<Item = &'static str> {
    std::iter::once(slot.as_str()).chain(aliases(slot).iter().copied())
}

/// Comparison key for form field names
pub fn normalize_field_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Slot whose candidate spellings include `field_name`
pub fn slot_for_field_name(field_name: &str) -> Option<Slot> {
    let wanted = normalize_field_name(field_name);
    Slot::ALL.into_iter().find(|slot| {
        field_name_candidates(*slot).any(|candidate| normalize_field_name(candidate) == wanted)
    })
}
