//! TL1 error codes.
//!
//! Protocol faults are answered on the wire with a `DENY` envelope; they are
//! values handed to the response builder, never propagated as `Err`.

use std::fmt;

use thiserror::Error;

/// CTAG used when the faulty line did not provide a usable one.
pub const NO_CTAG: &str = "0";

/// Closed set of TL1 error codes the emulator can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Missing or quoted correlation tag.
    Iict,
    /// Command not valid.
    Icnv,
    /// Missing target identifier.
    Iita,
    /// Login not active.
    Plna,
    /// Positional parameter missing.
    Ipms,
    /// Not enough colon blocks.
    Ibms,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 6] = [
        ErrorCode::Iict,
        ErrorCode::Icnv,
        ErrorCode::Iita,
        ErrorCode::Plna,
        ErrorCode::Ipms,
        ErrorCode::Ibms,
    ];

    /// Four letter code as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Iict => "IICT",
            ErrorCode::Icnv => "ICNV",
            ErrorCode::Iita => "IITA",
            ErrorCode::Plna => "PLNA",
            ErrorCode::Ipms => "IPMS",
            ErrorCode::Ibms => "IBMS",
        }
    }

    /// Comment line following the code in the error envelope.
    pub fn comment(&self) -> &'static str {
        match self {
            ErrorCode::Iict => "/*Input, Invalid Correlation Tag*/",
            ErrorCode::Icnv => "/*Input, Command Not Valid*/",
            ErrorCode::Iita => "/*Input, Invalid TArget identifier*/",
            ErrorCode::Plna => "/*Privilege, Login Not Active*/",
            ErrorCode::Ipms => "/*Input, Parameter MiSsing*/",
            ErrorCode::Ibms => "/*Input, Block MiSsing*/",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected TL1 line: the code plus the CTAG the answer is correlated with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code} (ctag {ctag})")]
pub struct Tl1Fault {
    pub code: ErrorCode,
    pub ctag: String,
}

impl Tl1Fault {
    /// Fault without a usable CTAG.
    pub fn new(code: ErrorCode) -> Self {
        Tl1Fault {
            code,
            ctag: NO_CTAG.to_string(),
        }
    }

    /// Fault correlated with `ctag`.
    pub fn with_ctag(code: ErrorCode, ctag: &str) -> Self {
        Tl1Fault {
            code,
            ctag: ctag.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_four_letters() {
        for code in ErrorCode::ALL {
            assert_eq!(code.as_str().len(), 4);
            assert!(code.comment().starts_with("/*"));
            assert!(code.comment().ends_with("*/"));
        }
    }

    #[test]
    fn test_fault_display() {
        assert_eq!(Tl1Fault::new(ErrorCode::Iita).to_string(), "IITA (ctag 0)");
        assert_eq!(
            Tl1Fault::with_ctag(ErrorCode::Plna, "7").to_string(),
            "PLNA (ctag 7)"
        );
    }
}
