use std::fmt;

/// How a loader must adjust a word when the program is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reloc {
    None,
    /// Low nine bits hold a page offset of a relative address.
    Page,
    /// The whole word is a relative address.
    Word,
}

impl fmt::Display for Reloc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reloc::None => Ok(()),
            Reloc::Page => write!(f, "M0"),
            Reloc::Word => write!(f, "M1"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Header { name: String, start: u16, length: u16 },
    Text { address: u16, word: u16, reloc: Reloc },
    Exec { address: u16, reloc: Reloc },
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Header {
                name,
                start,
                length,
            } => write!(f, "H{:<6}{:04X}{:04X}", name, start, length),
            Record::Text {
                address,
                word,
                reloc,
            } => write!(f, "T{:04X}{:04X}{}", address, word, reloc),
            Record::Exec { address, reloc } => write!(f, "E{:04X}{}", address, reloc),
        }
    }
}

/// Header, text records in address order, then the exec record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Object(pub Vec<Record>);

impl Object {
    pub fn lines(&self) -> Vec<String> {
        self.0.iter().map(|record| record.to_string()).collect()
    }

    pub fn is_relocatable(&self) -> bool {
        self.0
            .iter()
            .any(|record| matches!(record, Record::Header { start: 0, .. }))
            && self
                .0
                .iter()
                .any(|record| matches!(record, Record::Exec { reloc: Reloc::Word, .. }))
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.0 {
            writeln!(f, "{}", record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_text() {
        let header = Record::Header {
            name: "MAIN".to_string(),
            start: 0x3000,
            length: 0x1F,
        };
        assert_eq!(header.to_string(), "HMAIN  3000001F");
        let text = Record::Text {
            address: 0x3001,
            word: 0xabcd,
            reloc: Reloc::Page,
        };
        assert_eq!(text.to_string(), "T3001ABCDM0");
        let exec = Record::Exec {
            address: 0,
            reloc: Reloc::Word,
        };
        assert_eq!(exec.to_string(), "E0000M1");
    }

    #[test]
    fn object_text() {
        let object = Object(vec![
            Record::Header {
                name: String::new(),
                start: 0,
                length: 1,
            },
            Record::Text {
                address: 0,
                word: 0x1042,
                reloc: Reloc::None,
            },
            Record::Exec {
                address: 0,
                reloc: Reloc::Word,
            },
        ]);
        assert_eq!(object.to_string(), "H      00000001\nT00001042\nE0000M1\n");
        assert!(object.is_relocatable());
    }
}
