// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! This module defines
//! 1) a list of constants for every keyword of the dialect:
//!    `pub const SELECT = "SELECT"`
//! 2) an `ALL_KEYWORDS` array with every keyword in it
//! 3) a [`Keyword`] enum with a variant per keyword, plus `NoKeyword`
//!
//! Every keyword here is reserved: an unquoted identifier that matches one
//! of these (case-insensitively) lexes as the keyword, and the canonical
//! formatter backtick-escapes any identifier that would collide. Backtick
//! quoting always yields a plain identifier.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Defines a string constant for a single keyword: `kw_def!(SELECT);`
/// expands to `pub const SELECT = "SELECT";`
macro_rules! kw_def {
    ($ident:ident = $string_keyword:expr) => {
        pub const $ident: &'static str = $string_keyword;
    };
    ($ident:ident) => {
        kw_def!($ident = stringify!($ident));
    };
}

/// Expands to a list of `kw_def!()` invocations for each keyword
/// and defines an ALL_KEYWORDS array of the defined constants.
macro_rules! define_keywords {
    ($(
        $ident:ident $(= $string_keyword:expr)?
    ),*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[allow(non_camel_case_types)]
        pub enum Keyword {
            NoKeyword,
            $($ident),*
        }

        pub const ALL_KEYWORDS_INDEX: &[Keyword] = &[
            $(Keyword::$ident),*
        ];

        $(kw_def!($ident $(= $string_keyword)?);)*

        pub const ALL_KEYWORDS: &[&str] = &[
            $($ident),*
        ];
    }
}

// The following keywords should be sorted to be able to match using binary search
define_keywords!(
    ALL,
    ALTER,
    AND,
    AS,
    ASC,
    AUTO_INCREMENT,
    BETWEEN,
    BIGINT,
    BIT,
    BY,
    CASE,
    CHAR,
    CREATE,
    CROSS,
    DATE,
    DATETIME,
    DECIMAL,
    DEFAULT,
    DELETE,
    DESC,
    DESCRIBE,
    DISTINCT,
    DOUBLE,
    DROP,
    DUPLICATE,
    ELSE,
    END,
    EXCEPT,
    EXISTS,
    EXPLAIN,
    FLOAT,
    FOR,
    FORCE,
    FROM,
    GROUP,
    HAVING,
    IF,
    IGNORE,
    IN,
    INDEX,
    INNER,
    INSERT,
    INT,
    INTEGER,
    INTERSECT,
    INTO,
    IS,
    JOIN,
    KEY,
    LEFT,
    LIKE,
    LIMIT,
    LOCK,
    MEDIUMINT,
    MINUS,
    MODE,
    NATURAL,
    NOT,
    NULL,
    NUMERIC,
    ON,
    OR,
    ORDER,
    OUTER,
    PRIMARY,
    REAL,
    RENAME,
    RIGHT,
    SELECT,
    SET,
    SHARE,
    SHOW,
    SMALLINT,
    STRAIGHT_JOIN,
    TABLE,
    TEXT,
    THEN,
    TIME,
    TIMERANGE,
    TIMESTAMP,
    TINYINT,
    TO,
    UNION,
    UNIQUE,
    UNSIGNED,
    UPDATE,
    USE,
    USING,
    VALUES,
    VARCHAR,
    VIEW,
    WHEN,
    WHERE,
    YEAR,
    ZEROFILL
);

/// Looks up `ident` (raw bytes, any case) in the keyword table.
///
/// Returns [`Keyword::NoKeyword`] for anything that is not a keyword of the
/// dialect, including non-ASCII input.
pub fn lookup(ident: &[u8]) -> Keyword {
    // ALL_KEYWORDS is short enough that the uppercase copy never reallocates
    // into anything interesting; correctness over cleverness here.
    let upper = ident.to_ascii_uppercase();
    match ALL_KEYWORDS.binary_search_by(|kw| kw.as_bytes().cmp(upper.as_slice())) {
        Ok(i) => ALL_KEYWORDS_INDEX[i],
        Err(_) => Keyword::NoKeyword,
    }
}

/// True iff `ident` collides with a keyword and must be backtick-escaped
/// when emitted as a bare identifier.
pub fn is_keyword(ident: &[u8]) -> bool {
    lookup(ident) != Keyword::NoKeyword
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_sorted() {
        // ALL_KEYWORDS is sorted so that `lookup` can binary search it
        let mut copy = Vec::from(ALL_KEYWORDS);
        copy.sort_unstable();
        assert_eq!(copy, ALL_KEYWORDS);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup(b"select"), Keyword::SELECT);
        assert_eq!(lookup(b"SELECT"), Keyword::SELECT);
        assert_eq!(lookup(b"SeLeCt"), Keyword::SELECT);
        assert_eq!(lookup(b"straight_join"), Keyword::STRAIGHT_JOIN);
        assert_eq!(lookup(b"selects"), Keyword::NoKeyword);
        assert_eq!(lookup(b""), Keyword::NoKeyword);
    }

    #[test]
    fn non_ascii_is_not_a_keyword() {
        assert!(!is_keyword(b"s\xc3\xa9lect"));
        assert!(is_keyword(b"order"));
        assert!(!is_keyword(b"orders"));
    }
}
