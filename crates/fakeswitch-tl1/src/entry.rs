//! Listing entries of TL1 retrieve responses.

use std::fmt;

/// One quoted line of a retrieve response:
/// `AID:TYPE:key=value,key=value:STATUS,...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tl1Entry {
    pub aid: String,
    /// Type tag, empty when the entity has none.
    pub type_tag: String,
    /// Fields in report order, keys unique.
    pub fields: Vec<(String, String)>,
    pub statuses: Vec<String>,
}

impl Tl1Entry {
    pub fn new(aid: &str) -> Self {
        Tl1Entry {
            aid: aid.to_string(),
            type_tag: String::new(),
            fields: Vec::new(),
            statuses: Vec::new(),
        }
    }

    /// Set the type tag, builder style.
    pub fn with_type(mut self, type_tag: &str) -> Self {
        self.type_tag = type_tag.to_string();
        self
    }

    /// Add or replace a field, builder style.
    pub fn with_field(mut self, key: &str, value: &str) -> Self {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some(field) => field.1 = value.to_string(),
            None => self.fields.push((key.to_string(), value.to_string())),
        }
        self
    }

    /// Replace the status list, builder style.
    pub fn with_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statuses = statuses.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for Tl1Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:", self.aid, self.type_tag)?;

        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            // The entry itself is quoted on the wire
            write!(f, "{}={}", key, value.replace('"', "\\\""))?;
        }

        f.write_str(":")?;
        match self.statuses.as_slice() {
            [single] => write!(f, "{},", single),
            statuses => f.write_str(&statuses.join(",")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_card() {
        let entry = Tl1Entry::new("SP-1-15")
            .with_field("CTYPE", "\"Shelf Processor\"")
            .with_field("PEC", "NTK555FA")
            .with_statuses(["IS"]);

        assert_eq!(
            entry.to_string(),
            r#"SP-1-15::CTYPE=\"Shelf Processor\",PEC=NTK555FA:IS,"#
        );
    }

    #[test]
    fn test_status_rendering() {
        let entry = Tl1Entry::new("A").with_type("T");
        assert_eq!(entry.to_string(), "A:T::");

        let entry = entry.with_statuses(["OOS-AU", "FLT"]);
        assert_eq!(entry.to_string(), "A:T::OOS-AU,FLT");
    }

    #[test]
    fn test_replaced_field_keeps_position() {
        let entry = Tl1Entry::new("A")
            .with_field("X", "1")
            .with_field("Y", "2")
            .with_field("X", "3");
        assert_eq!(entry.to_string(), "A::X=3,Y=2:");
    }
}
