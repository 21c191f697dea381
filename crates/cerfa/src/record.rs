//! Applicant record

use serde::{Deserialize, Serialize};
use std::fmt;

/// One logical field of the mandate form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    NomPrenom,
    Adresse,
    CpVille,
    DateNaissance,
    VilleNaissance,
    Mail,
    Telephone,
    Immatriculation,
    #[serde(rename = "date_1er_immatriculation")]
    Date1erImmatriculation,
    MarqueModele,
    NumeroFormule,
}

impl Slot {
    /// Every slot, in form order
    pub const ALL: [Slot; 11] = [
        Slot::NomPrenom,
        Slot::Adresse,
        Slot::CpVille,
        Slot::DateNaissance,
        Slot::VilleNaissance,
        Slot::Mail,
        Slot::Telephone,
        Slot::Immatriculation,
        Slot::Date1erImmatriculation,
        Slot::MarqueModele,
        Slot::NumeroFormule,
    ];

    /// Wire name, also the default form-field spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::NomPrenom => "nom_prenom",
            Slot::Adresse => "adresse",
            Slot::CpVille => "cp_ville",
            Slot::DateNaissance => "date_naissance",
            Slot::VilleNaissance => "ville_naissance",
            Slot::Mail => "mail",
            Slot::Telephone => "telephone",
            Slot::Immatriculation => "immatriculation",
            Slot::Date1erImmatriculation => "date_1er_immatriculation",
            Slot::MarqueModele => "marque_modele",
            Slot::NumeroFormule => "numero_formule",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Slot::ALL.into_iter().find(|slot| slot.as_str() == name)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applicant data in the shape the form expects
///
/// Every field is independently optional. A field holding an empty or
/// blank string counts as absent for drawing and filling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub nom_prenom: Option<String>,
    pub adresse: Option<String>,
    pub cp_ville: Option<String>,
    pub date_naissance: Option<String>,
    pub ville_naissance: Option<String>,
    pub mail: Option<String>,
    pub telephone: Option<String>,
    pub immatriculation: Option<String>,
    pub date_1er_immatriculation: Option<String>,
    pub marque_modele: Option<String>,
    pub numero_formule: Option<String>,
}

impl ApplicantRecord {
    /// Raw stored value of a slot
    pub fn raw(&self, slot: Slot) -> Option<&String> {
        match slot {
            Slot::NomPrenom => self.nom_prenom.as_ref(),
            Slot::Adresse => self.adresse.as_ref(),
            Slot::CpVille => self.cp_ville.as_ref(),
            Slot::DateNaissance => self.date_naissance.as_ref(),
            Slot::VilleNaissance => self.ville_naissance.as_ref(),
            Slot::Mail => self.mail.as_ref(),
            Slot::Telephone => self.telephone.as_ref(),
            Slot::Immatriculation => self.immatriculation.as_ref(),
            Slot::Date1erImmatriculation => self.date_1er_immatriculation.as_ref(),
            Slot::MarqueModele => self.marque_modele.as_ref(),
            Slot::NumeroFormule => self.numero_formule.as_ref(),
        }
    }

    /// Populated value of a slot (absent when empty or blank)
    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.raw(slot)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn set(&mut self, slot: Slot, value: Option<String>) {
        let field = match slot {
            Slot::NomPrenom => &mut self.nom_prenom,
            Slot::Adresse => &mut self.adresse,
            Slot::CpVille => &mut self.cp_ville,
            Slot::DateNaissance => &mut self.date_naissance,
            Slot::VilleNaissance => &mut self.ville_naissance,
            Slot::Mail => &mut self.mail,
            Slot::Telephone => &mut self.telephone,
            Slot::Immatriculation => &mut self.immatriculation,
            Slot::Date1erImmatriculation => &mut self.date_1er_immatriculation,
            Slot::MarqueModele => &mut self.marque_modele,
            Slot::NumeroFormule => &mut self.numero_formule,
        };
        *field = value;
    }

    /// Populated slots with their values, in form order
    pub fn populated(&self) -> impl Iterator<Item = (Slot, &str)> + '_ {
        Slot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|value| (slot, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.populated().next().is_none()
    }
}

/// Split "postal code + city" on the first space
///
/// Surrounding whitespace is ignored; a value without a space is all code.
pub fn parse_cp_ville(value: &str) -> (&str, &str) {
    let value = value.trim();
    match value.split_once(' ') {
        Some((code, city)) => (code, city.trim_start()),
        None => (value, ""),
    }
}

/// Join a postal code and a city the way `parse_cp_ville` reads them
pub fn format_cp_ville(code: &str, city: &str) -> String {
    if city.is_empty() {
        code.to_string()
    } else {
        format!("{code} {city}")
    }
}
