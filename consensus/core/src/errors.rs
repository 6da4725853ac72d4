use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("raw block length {0} differs from the canonical 512 bytes")]
    BadRawLength(usize),

    #[error("encoded block exceeds 16 fields ({0} needed)")]
    Overflow(usize),

    #[error("address built from an all-zero hash")]
    ZeroHash,

    #[error("remark is not printable ASCII of at most 32 bytes")]
    BadRemark,

    #[error("invalid public key encoding: {0}")]
    BadPublicKey(secp256k1::Error),
}

pub type BlockResult<T> = std::result::Result<T, BlockError>;
