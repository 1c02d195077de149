//! shipflow の Docker エンジン
//!
//! ビルドコンテキストの作成、イメージのビルド・タグ付け、
//! レジストリへのプッシュを bollard 経由で行い、
//! `shipflow_core::ImageEngine` として提供します。

pub mod auth;
pub mod builder;
pub mod context;
pub mod engine;
pub mod error;
pub mod pusher;

pub use auth::{RegistryAuth, registry_host};
pub use builder::ImageBuilder;
pub use context::{BuildContext, ContextBuilder};
pub use engine::{DockerEngine, EngineOptions};
pub use error::{BuildError, BuildResult};
pub use pusher::{ImagePusher, split_image_tag, validate_tag};
