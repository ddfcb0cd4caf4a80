use crate::rank_support::MAX_SIGMA;

/// All of the ways in which building an index or running a query batch can fail.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error(
        "the alphabet has {num_symbols} symbols, but this index only supports up to {MAX_SIGMA}"
    )]
    AlphabetTooLarge { num_symbols: usize },

    #[error("the text contains a symbol that is not part of the alphabet")]
    SymbolNotInAlphabet,

    #[error("the total text length {text_len} exceeds the maximum of the index storage type")]
    TextTooLarge { text_len: usize },

    #[error("suffix array construction failed: {0}")]
    SuffixArrayConstruction(String),

    #[error(
        "sequence positions and ids require {required_bits} bits, \
         more than the 64 available in a sampled suffix array entry"
    )]
    PositionEncodingOverflow { required_bits: u32 },

    #[error("unknown search scheme generator \"{0}\"")]
    UnknownSchemeGenerator(String),

    #[error("the search scheme is invalid")]
    InvalidScheme,

    #[error(
        "a query of length {query_len} cannot be covered by a search scheme with {num_parts} parts"
    )]
    QueryTooShort { query_len: usize, num_parts: usize },

    #[cfg(feature = "savefile")]
    #[error("loading or saving the index failed: {0}")]
    Serialization(#[from] savefile::SavefileError),
}
