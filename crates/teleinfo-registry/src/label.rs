use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RegistryError;

/// How a label's value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Numeric,
    Text,
}

/// The labels this decoder tracks. Anything else on the wire is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Adco,
    Optarif,
    Isousc,
    Iinst,
    Papp,
    Base,
    Hchc,
    Hchp,
    Ejphn,
    Ejphpm,
    Ptec,
    Imax,
    Hhphc,
}

impl Label {
    pub const COUNT: usize = 13;

    /// Every label, in table order.
    pub const ALL: [Label; Label::COUNT] = [
        Label::Adco,
        Label::Optarif,
        Label::Isousc,
        Label::Iinst,
        Label::Papp,
        Label::Base,
        Label::Hchc,
        Label::Hchp,
        Label::Ejphn,
        Label::Ejphpm,
        Label::Ptec,
        Label::Imax,
        Label::Hhphc,
    ];

    /// Case-sensitive lookup of a wire label.
    pub fn lookup(name: &str) -> Option<Label> {
        Label::ALL.into_iter().find(|label| label.as_str() == name)
    }

    /// The label as transmitted by the meter.
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Adco => "ADCO",
            Label::Optarif => "OPTARIF",
            Label::Isousc => "ISOUSC",
            Label::Iinst => "IINST",
            Label::Papp => "PAPP",
            Label::Base => "BASE",
            Label::Hchc => "HCHC",
            Label::Hchp => "HCHP",
            Label::Ejphn => "EJPHN",
            Label::Ejphpm => "EJPHPM",
            Label::Ptec => "PTEC",
            Label::Imax => "IMAX",
            Label::Hhphc => "HHPHC",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Label::Adco | Label::Optarif | Label::Ptec | Label::Hhphc => FieldKind::Text,
            _ => FieldKind::Numeric,
        }
    }

    /// Divisor the publisher applies before reporting. Index counters are
    /// transmitted in Wh and reported in kWh; the registry keeps raw values.
    pub fn publish_divisor(self) -> Option<u32> {
        match self {
            Label::Base | Label::Hchc | Label::Hchp | Label::Ejphn | Label::Ejphpm => Some(1000),
            _ => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Label::Adco => "meter address",
            Label::Optarif => "tariff option",
            Label::Isousc => "subscribed current (A)",
            Label::Iinst => "instantaneous current (A)",
            Label::Papp => "apparent power (VA)",
            Label::Base => "base index (Wh)",
            Label::Hchc => "off-peak hours index (Wh)",
            Label::Hchp => "peak hours index (Wh)",
            Label::Ejphn => "EJP normal hours index (Wh)",
            Label::Ejphpm => "EJP mobile peak hours index (Wh)",
            Label::Ptec => "current tariff period",
            Label::Imax => "maximum current drawn (A)",
            Label::Hhphc => "peak/off-peak schedule",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::lookup(s).ok_or_else(|| RegistryError::UnknownLabel(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_indices() {
        for (i, label) in Label::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(Label::lookup("IINST"), Some(Label::Iinst));
        assert_eq!(Label::lookup("iinst"), None);
        assert_eq!(Label::lookup("IINST1"), None);
        assert_eq!(Label::lookup(""), None);
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for label in Label::ALL {
            assert_eq!(label.as_str().parse::<Label>(), Ok(label));
        }
        assert_eq!(
            "ZZZZ".parse::<Label>(),
            Err(RegistryError::UnknownLabel("ZZZZ".to_string()))
        );
    }

    #[test]
    fn kinds_follow_the_table() {
        let text: Vec<Label> = Label::ALL
            .into_iter()
            .filter(|l| l.kind() == FieldKind::Text)
            .collect();
        assert_eq!(
            text,
            vec![Label::Adco, Label::Optarif, Label::Ptec, Label::Hhphc]
        );
    }

    #[test]
    fn only_index_counters_are_scaled() {
        assert_eq!(Label::Base.publish_divisor(), Some(1000));
        assert_eq!(Label::Ejphpm.publish_divisor(), Some(1000));
        assert_eq!(Label::Papp.publish_divisor(), None);
        assert_eq!(Label::Adco.publish_divisor(), None);
    }

    #[test]
    fn serializes_as_wire_name() {
        assert_eq!(
            serde_json::to_string(&Label::Ejphpm).unwrap(),
            "\"EJPHPM\""
        );
        assert_eq!(
            serde_json::to_string(&FieldKind::Numeric).unwrap(),
            "\"numeric\""
        );
    }
}
