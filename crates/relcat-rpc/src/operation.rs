// crates/relcat-rpc/src/operation.rs
//
// Operation descriptors for the ReleaseService RPCs.
//
// Each operation carries its gRPC path and an admission tag. Admission
// stages consult the tag instead of comparing method-name strings.

use serde::{Deserialize, Serialize};

/// Fully-qualified gRPC service name.
pub const SERVICE_NAME: &str = "relcat.v1.ReleaseService";

/// Whether an operation passes through credential checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Admission {
    /// Callers must present a valid credential.
    Required,
    /// Callers are admitted without credentials.
    Exempt,
}

/// The operations exposed by ReleaseService.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    GetReleaseInfo,
    ListReleases,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Operation; 2] = [Operation::GetReleaseInfo, Operation::ListReleases];

    /// Method name as it appears in the gRPC path.
    pub fn name(self) -> &'static str {
        match self {
            Operation::GetReleaseInfo => "GetReleaseInfo",
            Operation::ListReleases => "ListReleases",
        }
    }

    /// Full gRPC path, e.g. "/relcat.v1.ReleaseService/ListReleases".
    pub fn path(self) -> &'static str {
        match self {
            Operation::GetReleaseInfo => "/relcat.v1.ReleaseService/GetReleaseInfo",
            Operation::ListReleases => "/relcat.v1.ReleaseService/ListReleases",
        }
    }

    /// Default admission tag. Listing is public; single lookups are not.
    pub fn admission(self) -> Admission {
        match self {
            Operation::GetReleaseInfo => Admission::Required,
            Operation::ListReleases => Admission::Exempt,
        }
    }

    /// Resolve an operation from an inbound request path.
    pub fn from_path(path: &str) -> Option<Operation> {
        Self::ALL.into_iter().find(|op| op.path() == path)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
