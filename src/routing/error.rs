//! Registration errors and dispatch outcomes.

use thiserror::Error;

use crate::rbac::RbacError;

/// Boxed error raised by application handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while registering routes or mounting targets.
///
/// These are programmer errors: they surface synchronously during setup and
/// are not meant to be recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route 'mapping' is mandatory")]
    MissingMapping,

    #[error("route 'handler' is mandatory")]
    MissingHandler,

    #[error("non-unique route name: '{0}'")]
    DuplicateName(String),

    #[error("unnamed parameter in route '{mapping}'")]
    UnnamedParameter { mapping: String },

    #[error("duplicate parameter '{param}' in route '{mapping}'")]
    DuplicateParameter { param: String, mapping: String },

    #[error("collision of parameters '{existing}' and '{param}' in route '{mapping}'")]
    ParameterCollision {
        existing: String,
        param: String,
        mapping: String,
    },

    #[error("path is used by middleware")]
    PathUsedByMiddleware,

    #[error("expected prefix string")]
    EmptyPrefix,

    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    #[error("parametrized prefix: {0}")]
    ParametrizedPrefix(String),

    #[error("prefix path is used by middleware")]
    PrefixUsedByMiddleware,

    #[error("mount point already in use: {0}")]
    MountPointOccupied(String),

    #[error("router is already mounted")]
    AlreadyMounted,

    #[error("router cannot be mounted under itself")]
    MountCycle,

    #[error("unknown router")]
    UnknownRouter,
}

/// Outcome of a dispatch that did not complete normally.
///
/// `NotFound` and `Forbidden` are what the default not-found and prohibition
/// handlers signal; anything a handler returns is passed through untouched.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    /// Handler-chosen status, e.g. `400 Bad Request`.
    #[error("{code}: {message}")]
    Status { code: u16, message: String },

    /// Role resolution failed while authorizing.
    #[error(transparent)]
    Rbac(#[from] RbacError),

    #[error(transparent)]
    Handler(BoxError),
}

impl DispatchError {
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        DispatchError::Status {
            code,
            message: message.into(),
        }
    }

    pub fn handler(err: impl Into<BoxError>) -> Self {
        DispatchError::Handler(err.into())
    }

    /// HTTP status the transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::NotFound => 404,
            DispatchError::Forbidden => 403,
            DispatchError::Status { code, .. } => *code,
            DispatchError::Rbac(_) | DispatchError::Handler(_) => 500,
        }
    }
}
