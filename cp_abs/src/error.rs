use crate::{curves::SecurityLevel, polynomial::ShareId};
use abs_crypto_utils::serde_utils::BigIntError;

#[derive(Debug)]
pub enum ABSError {
    EmptyPolicy,
    /// Count or nesting of `{` and `}` is wrong
    UnbalancedBraces(String),
    /// Count or nesting of `[` and `]` is wrong
    UnbalancedBrackets(String),
    /// Threshold block missing or not of the form `[n,t]`
    InvalidThresholdBlock(String),
    /// Threshold `t` is 0 or bigger than the number of children `n`
    InvalidThresholdOrTotal(ShareId, ShareId),
    /// Declared number of children differs from the number of sub-policies
    ChildCountMismatch(ShareId, usize),
    EmptySubPolicy(String),
    DuplicateSubPolicy(String),
    InvalidAttributeName(String),
    /// Gates nest deeper than the given limit
    PolicyTooDeep(usize),
    EmptyUserId,
    EmptyContractName,
    EmptyFunctionName,
    EmptyAttributeSet,
    EmptyAttribute,
    EmptySignature,
    MalformedSignature(String),
    MalformedSecretKey(String),
    UserNotRegistered(String),
    FunctionNotRegistered(String),
    SystemParamsNotFound,
    /// The access tree was already given its polynomials
    TreeAlreadyInitialized,
    /// Key generation needs the polynomials assigned by `AccessTree::init`
    TreeNotInitialized,
    CannotInvert0,
    PointAtInfinity,
    InvalidPoint,
    InvalidBigInt(BigIntError),
    /// Record was created on a different curve than the one it is being loaded into
    CurveMismatch(SecurityLevel, SecurityLevel),
    InvalidRecord(String),
    Json(serde_json::Error),
    Store(String),
}

/// Coarse classification of errors so that callers can tell a bad input from a missing
/// registration or an arithmetic fault. A failed verification is not an error at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Arithmetic,
    Storage,
}

impl ABSError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyPolicy
            | Self::UnbalancedBraces(_)
            | Self::UnbalancedBrackets(_)
            | Self::InvalidThresholdBlock(_)
            | Self::InvalidThresholdOrTotal(_, _)
            | Self::ChildCountMismatch(_, _)
            | Self::EmptySubPolicy(_)
            | Self::DuplicateSubPolicy(_)
            | Self::InvalidAttributeName(_)
            | Self::PolicyTooDeep(_)
            | Self::EmptyUserId
            | Self::EmptyContractName
            | Self::EmptyFunctionName
            | Self::EmptyAttributeSet
            | Self::EmptyAttribute
            | Self::EmptySignature
            | Self::MalformedSignature(_)
            | Self::MalformedSecretKey(_) => ErrorKind::Validation,
            Self::UserNotRegistered(_)
            | Self::FunctionNotRegistered(_)
            | Self::SystemParamsNotFound => ErrorKind::NotFound,
            Self::TreeAlreadyInitialized
            | Self::TreeNotInitialized
            | Self::CannotInvert0
            | Self::PointAtInfinity
            | Self::InvalidPoint
            | Self::InvalidBigInt(_) => ErrorKind::Arithmetic,
            Self::CurveMismatch(_, _)
            | Self::InvalidRecord(_)
            | Self::Json(_)
            | Self::Store(_) => ErrorKind::Storage,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

impl From<BigIntError> for ABSError {
    fn from(e: BigIntError) -> Self {
        Self::InvalidBigInt(e)
    }
}

impl From<serde_json::Error> for ABSError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
