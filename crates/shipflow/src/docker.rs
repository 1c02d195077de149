use colored::Colorize;

/// Docker デーモンに接続し、ping で疎通を確認する
pub async fn connect() -> anyhow::Result<bollard::Docker> {
    let docker = match bollard::Docker::connect_with_local_defaults() {
        Ok(docker) => docker,
        Err(e) => return Err(connection_error(&e)),
    };

    match docker.ping().await {
        Ok(_) => Ok(docker),
        Err(e) => Err(connection_error(&e)),
    }
}

fn connection_error(cause: &bollard::errors::Error) -> anyhow::Error {
    eprintln!();
    eprintln!("{}", "✗ Docker接続エラー".red().bold());
    eprintln!();
    eprintln!("{}", "原因:".yellow());
    eprintln!("  {}", cause);
    eprintln!();
    eprintln!("{}", "解決方法:".yellow());
    eprintln!("  • Dockerが起動しているか確認してください");
    eprintln!("  • DOCKER_HOST が正しいソケットを指しているか確認してください");
    eprintln!("  • ビルドせずに対象を確認するだけなら `ship plan` を使ってください");
    anyhow::anyhow!("Docker接続に失敗しました")
}
