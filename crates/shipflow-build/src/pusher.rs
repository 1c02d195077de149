//! イメージプッシュ処理

use crate::auth::RegistryAuth;
use crate::error::{BuildError, BuildResult};
use bollard::Docker;
use bollard::models::PushImageInfo;
use futures_util::StreamExt;
use shipflow_core::ProcessOutput;

pub struct ImagePusher {
    docker: Docker,
    auth: RegistryAuth,
}

impl ImagePusher {
    pub fn new(docker: Docker) -> Self {
        Self::with_auth(docker, RegistryAuth::new())
    }

    pub fn with_auth(docker: Docker, auth: RegistryAuth) -> Self {
        Self { docker, auth }
    }

    /// `image:tag` をレジストリにプッシュし、デーモンの出力を返す
    pub async fn push(&self, image: &str, tag: &str) -> BuildResult<ProcessOutput> {
        validate_tag(tag)?;

        let full_image = format!("{}:{}", image, tag);
        let credentials = self.auth.credentials_for(&full_image)?;

        #[allow(deprecated)]
        let options = bollard::image::PushImageOptions::<String> {
            tag: tag.to_string(),
        };

        tracing::info!(image = %full_image, "Pushing image");

        #[allow(deprecated)]
        let mut stream = self.docker.push_image(image, Some(options), credentials);

        let mut output = ProcessOutput::default();
        let mut error_message: Option<String> = None;

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(err) = info.error {
                        output.stderr.push_str(&err);
                        output.stderr.push('\n');
                        error_message = Some(err);
                    } else {
                        record_progress(&info, &mut output);
                    }
                }
                Err(e) => {
                    output.stderr.push_str(&format!("{}\n", e));
                    return Err(BuildError::PushFailed {
                        message: e.to_string(),
                        output,
                    });
                }
            }
        }

        if let Some(message) = error_message {
            return Err(BuildError::PushFailed { message, output });
        }

        tracing::info!(image = %full_image, "Pushed");
        Ok(output)
    }
}

/// Docker タグの制約
///
/// - 128文字以下
/// - 英数字、ピリオド、ハイフン、アンダースコアのみ
/// - 先頭はピリオドまたはハイフンではない
pub fn validate_tag(tag: &str) -> BuildResult<()> {
    let valid = !tag.is_empty()
        && tag.len() <= 128
        && !tag.starts_with(['.', '-'])
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));

    if valid {
        Ok(())
    } else {
        Err(BuildError::InvalidTag {
            tag: tag.to_string(),
        })
    }
}

/// レイヤーごとの進捗を出力に記録（転送中の進捗バーは除く）
fn record_progress(info: &PushImageInfo, output: &mut ProcessOutput) {
    let Some(status) = &info.status else {
        return;
    };

    match status.as_str() {
        "Pushing" | "Preparing" | "Waiting" => {}
        _ => {
            output.stdout.push_str(status);
            output.stdout.push('\n');
        }
    }
}

/// イメージ名とタグを分離
///
/// - `ghcr.io/org/app:v1.0` -> `("ghcr.io/org/app", "v1.0")`
/// - `ghcr.io/org/app` -> `("ghcr.io/org/app", "latest")`
/// - `localhost:5000/app:dev` -> `("localhost:5000/app", "dev")`
pub fn split_image_tag(image: &str) -> (String, String) {
    if let Some((name, tag)) = image.rsplit_once(':') {
        // localhost:5000/app の ":5000/app" はタグではない
        if !tag.contains('/') {
            return (name.to_string(), tag.to_string());
        }
    }

    (image.to_string(), "latest".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_image_tag_flat_build_tag() {
        let (image, tag) = split_image_tag("docker.io/zwh188222/densematrix:api-0.5.1");
        assert_eq!(image, "docker.io/zwh188222/densematrix");
        assert_eq!(tag, "api-0.5.1");
    }

    #[test]
    fn test_split_image_tag_without_tag() {
        let (image, tag) = split_image_tag("ghcr.io/org/app");
        assert_eq!(image, "ghcr.io/org/app");
        assert_eq!(tag, "latest");
    }

    #[test]
    fn test_split_image_tag_with_port() {
        let (image, tag) = split_image_tag("localhost:5000/app");
        assert_eq!(image, "localhost:5000/app");
        assert_eq!(tag, "latest");

        let (image, tag) = split_image_tag("localhost:5000/app:dev");
        assert_eq!(image, "localhost:5000/app");
        assert_eq!(tag, "dev");
    }

    #[test]
    fn test_validate_tag() {
        assert!(validate_tag("api-0.5.1").is_ok());
        assert!(validate_tag("image-1.0_rc1").is_ok());
        assert!(validate_tag("").is_err());
        assert!(validate_tag("-api").is_err());
        assert!(validate_tag(".api").is_err());
        assert!(validate_tag("api/1").is_err());
        assert!(validate_tag(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_record_progress_skips_transfer_noise() {
        let mut output = ProcessOutput::default();
        for status in ["Preparing", "Pushing", "Layer already exists", "Pushed"] {
            let info = PushImageInfo {
                status: Some(status.to_string()),
                ..Default::default()
            };
            record_progress(&info, &mut output);
        }
        assert_eq!(output.stdout, "Layer already exists\nPushed\n");
    }
}
