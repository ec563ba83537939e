use chrono::NaiveDate;

use crate::error::SchemaError;

pub const MIN_NUMBER: u8 = 1;
pub const MAX_NUMBER: u8 = 90;
pub const POOL_SIZE: usize = MAX_NUMBER as usize;
pub const PICK_COUNT: usize = 5;

/// Last number of the "low" half of the pool.
pub const LOW_MAX: u8 = 45;

/// A draw pool. The eleven known wheels are listed in archive order;
/// `Unknown` carries a code the abbreviation table does not recognize.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Wheel {
    Bari,
    Cagliari,
    Firenze,
    Genova,
    Milano,
    Napoli,
    Palermo,
    Roma,
    Torino,
    Venezia,
    Nazionale,
    Unknown(String),
}

pub const WHEELS: [Wheel; 11] = [
    Wheel::Bari,
    Wheel::Cagliari,
    Wheel::Firenze,
    Wheel::Genova,
    Wheel::Milano,
    Wheel::Napoli,
    Wheel::Palermo,
    Wheel::Roma,
    Wheel::Torino,
    Wheel::Venezia,
    Wheel::Nazionale,
];

impl Wheel {
    /// Normalizes a raw wheel code, either a historical two-letter
    /// abbreviation or a full name. Unrecognized codes are kept verbatim.
    pub fn from_code(raw: &str) -> Wheel {
        let code = raw.trim().to_uppercase();
        match code.as_str() {
            "BA" | "BARI" => Wheel::Bari,
            "CA" | "CAGLIARI" => Wheel::Cagliari,
            "FI" | "FIRENZE" => Wheel::Firenze,
            "GE" | "GENOVA" => Wheel::Genova,
            "MI" | "MILANO" => Wheel::Milano,
            "NA" | "NAPOLI" => Wheel::Napoli,
            "PA" | "PALERMO" => Wheel::Palermo,
            "RM" | "ROMA" => Wheel::Roma,
            "TO" | "TORINO" => Wheel::Torino,
            "VE" | "VENEZIA" => Wheel::Venezia,
            "RN" | "NAZIONALE" => Wheel::Nazionale,
            _ => Wheel::Unknown(raw.trim().to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Wheel::Bari => "BARI",
            Wheel::Cagliari => "CAGLIARI",
            Wheel::Firenze => "FIRENZE",
            Wheel::Genova => "GENOVA",
            Wheel::Milano => "MILANO",
            Wheel::Napoli => "NAPOLI",
            Wheel::Palermo => "PALERMO",
            Wheel::Roma => "ROMA",
            Wheel::Torino => "TORINO",
            Wheel::Venezia => "VENEZIA",
            Wheel::Nazionale => "NAZIONALE",
            Wheel::Unknown(code) => code,
        }
    }

    pub fn abbreviation(&self) -> Option<&'static str> {
        match self {
            Wheel::Bari => Some("BA"),
            Wheel::Cagliari => Some("CA"),
            Wheel::Firenze => Some("FI"),
            Wheel::Genova => Some("GE"),
            Wheel::Milano => Some("MI"),
            Wheel::Napoli => Some("NA"),
            Wheel::Palermo => Some("PA"),
            Wheel::Roma => Some("RM"),
            Wheel::Torino => Some("TO"),
            Wheel::Venezia => Some("VE"),
            Wheel::Nazionale => Some("RN"),
            Wheel::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Wheel::Unknown(_))
    }
}

impl std::fmt::Display for Wheel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One dated draw of a wheel. A complete draw carries five numbers; older
/// archive rows may miss trailing numbers, which are simply absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    date: NaiveDate,
    wheel: Wheel,
    numbers: Vec<u8>,
}

impl DrawRecord {
    pub fn new(date: NaiveDate, wheel: Wheel, numbers: Vec<u8>) -> Result<Self, SchemaError> {
        validate_numbers(&numbers)?;
        Ok(Self { date, wheel, numbers })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn wheel(&self) -> &Wheel {
        &self.wheel
    }

    /// Numbers in extraction order.
    pub fn numbers(&self) -> &[u8] {
        &self.numbers
    }

    pub fn is_complete(&self) -> bool {
        self.numbers.len() == PICK_COUNT
    }

    pub fn complete_numbers(&self) -> Option<[u8; PICK_COUNT]> {
        self.numbers.as_slice().try_into().ok()
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }
}

pub fn validate_numbers(numbers: &[u8]) -> Result<(), SchemaError> {
    if numbers.is_empty() || numbers.len() > PICK_COUNT {
        return Err(SchemaError::NumberCount { found: numbers.len() });
    }
    for &n in numbers {
        if !(MIN_NUMBER..=MAX_NUMBER).contains(&n) {
            return Err(SchemaError::OutOfRange { value: n as i64 });
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                return Err(SchemaError::Duplicate(numbers[i]));
            }
        }
    }
    Ok(())
}

/// A row as handed over by the ingestion collaborator: already split into
/// fields, date already normalized to ISO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line: usize,
    pub fields: Vec<String>,
}

impl RawRow {
    pub fn new<I, S>(line: usize, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            line,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parse(&self) -> Result<DrawRecord, SchemaError> {
        let found = self.fields.len();
        if !(3..=2 + PICK_COUNT).contains(&found) {
            return Err(SchemaError::Arity { found });
        }
        if let Some(idx) = self.fields.iter().position(|f| f.contains(char::REPLACEMENT_CHARACTER)) {
            return Err(SchemaError::Encoding { position: idx + 1 });
        }

        let raw_date = self.fields[0].trim();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|_| SchemaError::InvalidDate(raw_date.to_string()))?;
        let wheel = Wheel::from_code(&self.fields[1]);

        // Blank trailing fields are missing numbers; a value after a blank is not.
        let mut numbers = Vec::with_capacity(PICK_COUNT);
        let mut missing_from: Option<usize> = None;
        for (offset, field) in self.fields[2..].iter().enumerate() {
            let position = offset + 1;
            let value = field.trim();
            if value.is_empty() {
                missing_from.get_or_insert(position);
                continue;
            }
            if missing_from.is_some() {
                return Err(SchemaError::Gap { position });
            }
            let parsed: i64 = value.parse().map_err(|_| SchemaError::NotNumeric {
                position,
                value: value.to_string(),
            })?;
            if !(MIN_NUMBER as i64..=MAX_NUMBER as i64).contains(&parsed) {
                return Err(SchemaError::OutOfRange { value: parsed });
            }
            numbers.push(parsed as u8);
        }

        DrawRecord::new(date, wheel, numbers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> RawRow {
        RawRow::new(1, fields.iter().copied())
    }

    #[test]
    fn test_wheel_abbreviations() {
        assert_eq!(Wheel::from_code("NA"), Wheel::Napoli);
        assert_eq!(Wheel::from_code("RN"), Wheel::Nazionale);
        assert_eq!(Wheel::from_code("rm"), Wheel::Roma);
        assert_eq!(Wheel::from_code("MILANO"), Wheel::Milano);
        for wheel in WHEELS.iter() {
            let code = wheel.abbreviation().unwrap();
            assert_eq!(&Wheel::from_code(code), wheel);
            assert_eq!(&Wheel::from_code(wheel.name()), wheel);
        }
    }

    #[test]
    fn test_unknown_wheel_propagates() {
        let wheel = Wheel::from_code("XX");
        assert_eq!(wheel, Wheel::Unknown("XX".to_string()));
        assert!(!wheel.is_known());
        assert_eq!(wheel.name(), "XX");
    }

    #[test]
    fn test_validate_numbers() {
        assert!(validate_numbers(&[1, 2, 3, 4, 5]).is_ok());
        assert!(validate_numbers(&[90, 89, 88]).is_ok());
        assert_eq!(validate_numbers(&[0, 2, 3, 4, 5]), Err(SchemaError::OutOfRange { value: 0 }));
        assert_eq!(validate_numbers(&[1, 1, 3, 4, 5]), Err(SchemaError::Duplicate(1)));
        assert_eq!(validate_numbers(&[]), Err(SchemaError::NumberCount { found: 0 }));
        assert_eq!(
            validate_numbers(&[1, 2, 3, 4, 5, 6]),
            Err(SchemaError::NumberCount { found: 6 })
        );
    }

    #[test]
    fn test_parse_complete_row() {
        let record = row(&["2024-01-02", "BA", "12", " 5", "90", "33", "41"]).parse().unwrap();
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(record.wheel(), &Wheel::Bari);
        assert_eq!(record.numbers(), &[12, 5, 90, 33, 41]);
        assert!(record.is_complete());
        assert_eq!(record.complete_numbers(), Some([12, 5, 90, 33, 41]));
    }

    #[test]
    fn test_parse_missing_trailing_numbers() {
        let record = row(&["1939-01-07", "TO", "4", "17", "", ""]).parse().unwrap();
        assert_eq!(record.numbers(), &[4, 17]);
        assert!(!record.is_complete());
        assert_eq!(record.complete_numbers(), None);
    }

    #[test]
    fn test_parse_rejects_gap() {
        let err = row(&["2024-01-02", "BA", "4", "", "17"]).parse().unwrap_err();
        assert_eq!(err, SchemaError::Gap { position: 3 });
    }

    #[test]
    fn test_parse_rejects_bad_rows() {
        assert_eq!(
            row(&["2024-01-02", "BA"]).parse().unwrap_err(),
            SchemaError::Arity { found: 2 }
        );
        assert_eq!(
            row(&["2024-01-02", "BA", "1", "2", "3", "4", "5", "6"]).parse().unwrap_err(),
            SchemaError::Arity { found: 8 }
        );
        assert_eq!(
            row(&["2024-01-02", "BA", "1", "x", "3", "4", "5"]).parse().unwrap_err(),
            SchemaError::NotNumeric { position: 2, value: "x".to_string() }
        );
        assert_eq!(
            row(&["2024-01-02", "BA", "1", "2", "300", "4", "5"]).parse().unwrap_err(),
            SchemaError::OutOfRange { value: 300 }
        );
        assert_eq!(
            row(&["2024-01-02", "BA", "1", "2", "2", "4", "5"]).parse().unwrap_err(),
            SchemaError::Duplicate(2)
        );
        assert_eq!(
            row(&["02/01/2024", "BA", "1", "2", "3", "4", "5"]).parse().unwrap_err(),
            SchemaError::InvalidDate("02/01/2024".to_string())
        );
    }
}
