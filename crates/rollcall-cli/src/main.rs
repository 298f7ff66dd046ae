use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "rollcall", about = "Named photos of people, behind a face unlock")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the photo grid (empty while locked)
    List,
    /// Add a person from an image file or the camera
    Add(AddArgs),
    /// Rename the person at a grid position
    Rename {
        index: u32,
        /// New display name (may be empty)
        name: String,
    },
    /// Delete the person at a grid position
    Delete { index: u32 },
    /// Verify your face and reveal the grid
    Unlock,
    /// Hide the grid again
    Lock,
    /// Show daemon status
    Status,
    /// List camera devices (bypasses the daemon)
    Cameras,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct AddArgs {
    /// Pick an existing image file
    #[arg(short, long, value_name = "PATH")]
    library: Option<PathBuf>,
    /// Take a photo with the camera
    #[arg(short, long)]
    camera: bool,
}

#[zbus::proxy(
    interface = "org.rollcall.Gallery1",
    default_service = "org.rollcall.Gallery1",
    default_path = "/org/rollcall/Gallery1"
)]
trait Gallery {
    async fn add_from_library(&self, path: &str) -> zbus::Result<u32>;
    async fn add_from_camera(&self) -> zbus::Result<u32>;
    async fn rename(&self, index: u32, name: &str) -> zbus::Result<bool>;
    async fn delete(&self, index: u32) -> zbus::Result<bool>;
    async fn unlock(&self) -> zbus::Result<bool>;
    async fn lock(&self) -> zbus::Result<bool>;
    async fn list(&self) -> zbus::Result<String>;
    async fn status(&self) -> zbus::Result<String>;
}

/// One grid cell as sent by `List`.
#[derive(Debug, Deserialize)]
struct Row {
    index: usize,
    name: String,
    path: String,
}

/// Turn a daemon error into the alert text it carries.
fn alert(err: zbus::Error) -> anyhow::Error {
    match err {
        zbus::Error::MethodError(_, Some(detail), _) => anyhow::anyhow!(detail),
        other => anyhow::Error::new(other).context("call to rollcalld failed"),
    }
}

async fn connect() -> Result<GalleryProxy<'static>> {
    let conn = zbus::Connection::session()
        .await
        .context("failed to connect to the session bus")?;
    tracing::debug!("connected to session bus");
    Ok(GalleryProxy::new(&conn).await?)
}

fn render_grid(rows: &[Row]) -> String {
    let width = rows
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);
    let mut out = format!("{:>3}  {:<width$}  PHOTO\n", "#", "NAME");
    for row in rows {
        out.push_str(&format!("{:>3}  {:<width$}  {}\n", row.index, row.name, row.path));
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cameras => {
            let devices = rollcall_hw::Camera::list_devices();
            if devices.is_empty() {
                println!("No camera devices found");
            }
            for d in devices {
                println!("{}  {} ({}, {})", d.path, d.name, d.driver, d.bus);
            }
        }
        Commands::List => {
            let proxy = connect().await?;
            let status: serde_json::Value =
                serde_json::from_str(&proxy.status().await.map_err(alert)?)?;
            if status["unlocked"] != serde_json::Value::Bool(true) {
                println!("Locked. Run `rollcall unlock` to show photos.");
                return Ok(());
            }
            let rows: Vec<Row> = serde_json::from_str(&proxy.list().await.map_err(alert)?)?;
            if rows.is_empty() {
                println!("No people yet. Add one with `rollcall add`.");
            } else {
                print!("{}", render_grid(&rows));
            }
        }
        Commands::Add(args) => {
            let proxy = connect().await?;
            let index = match args.library {
                Some(path) => {
                    // The daemon resolves paths from its own working directory.
                    let path = std::fs::canonicalize(&path)
                        .with_context(|| format!("cannot read {}", path.display()))?;
                    proxy
                        .add_from_library(&path.to_string_lossy())
                        .await
                        .map_err(alert)?
                }
                None => {
                    println!("Capturing photo...");
                    proxy.add_from_camera().await.map_err(alert)?
                }
            };
            println!("Added person #{index} (Unknown)");
        }
        Commands::Rename { index, name } => {
            let proxy = connect().await?;
            proxy.rename(index, &name).await.map_err(alert)?;
            println!("Renamed #{index} to {name:?}");
        }
        Commands::Delete { index } => {
            let proxy = connect().await?;
            proxy.delete(index).await.map_err(alert)?;
            println!("Deleted #{index}");
        }
        Commands::Unlock => {
            let proxy = connect().await?;
            println!("Identify yourself!");
            proxy.unlock().await.map_err(alert)?;
            println!("Unlocked");
        }
        Commands::Lock => {
            let proxy = connect().await?;
            proxy.lock().await.map_err(alert)?;
            println!("Locked");
        }
        Commands::Status => {
            let proxy = connect().await?;
            let status: serde_json::Value =
                serde_json::from_str(&proxy.status().await.map_err(alert)?)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["rollcall", "add"]).is_err());
        assert!(Cli::try_parse_from(["rollcall", "add", "--camera", "--library", "a.jpg"]).is_err());
        assert!(Cli::try_parse_from(["rollcall", "add", "--camera"]).is_ok());
    }

    #[test]
    fn test_cameras_is_a_regular_command() {
        let cli = Cli::try_parse_from(["rollcall", "cameras"]).unwrap();
        assert!(matches!(cli.command, Commands::Cameras));
    }

    #[test]
    fn test_rename_allows_empty_name() {
        let cli = Cli::try_parse_from(["rollcall", "rename", "2", ""]).unwrap();
        assert!(matches!(cli.command, Commands::Rename { index: 2, ref name } if name.is_empty()));
    }

    #[test]
    fn test_render_grid() {
        let rows: Vec<Row> = serde_json::from_str(
            r#"[{"index":0,"name":"Ada","image":"a.jpg","path":"/p/a.jpg"},
                {"index":1,"name":"Unknown","image":"b.jpg","path":"/p/b.jpg"}]"#,
        )
        .unwrap();
        let grid = render_grid(&rows);
        let lines: Vec<&str> = grid.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "  0  Ada      /p/a.jpg");
        assert_eq!(lines[2], "  1  Unknown  /p/b.jpg");
    }

    #[test]
    fn test_render_grid_pads_by_characters() {
        let rows: Vec<Row> = serde_json::from_str(
            r#"[{"index":0,"name":"Zoë","path":"/p/a.jpg"},
                {"index":1,"name":"Björnsson","path":"/p/b.jpg"}]"#,
        )
        .unwrap();
        let grid = render_grid(&rows);
        let photo_columns: Vec<usize> = grid
            .lines()
            .map(|line| line.chars().position(|c| c == '/' || c == 'P').unwrap())
            .collect();
        assert_eq!(photo_columns, vec![16, 16, 16]);
    }
}
