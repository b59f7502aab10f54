mod traits;
mod manager;
mod composer;
mod platform;
mod installed;
mod path;
mod package;
mod artifact;
pub mod vcs;

pub use traits::*;
pub use manager::*;
pub use composer::*;
pub use platform::*;
pub use installed::*;
pub use path::*;
pub use package::*;
pub use artifact::*;
pub use vcs::{VcsRepository, VcsType, GitDriver, GitHubDriver, GitLabDriver, BitbucketDriver, get_head_commit};
