use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use reqwest::{Client, Method, RequestBuilder, Response, Url};

const VERSION_ID_HEADER: &str = "x-amz-version-id";
const DELETE_MARKER_HEADER: &str = "x-amz-delete-marker";

#[derive(Parser, Debug)]
#[command(name = "versioned-store-cli")]
#[command(about = "CLI for interacting with the versioned object store server", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(short, long, env = "VERSIONED_STORE_URL", default_value = "http://localhost:3000")]
    url: String,

    /// Access key sent in the Authorization header; anonymous when absent
    #[arg(long, env = "VERSIONED_STORE_ACCESS_KEY")]
    access_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a bucket
    Mb {
        bucket: String,
        /// Canned ACL: private, public-read or public-read-write
        #[arg(long)]
        acl: Option<String>,
    },

    /// Show or change bucket versioning
    Versioning {
        #[command(subcommand)]
        command: VersioningCommands,
    },

    /// Upload an object
    Put {
        bucket: String,
        key: String,
        /// File path to upload
        file: String,
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Download an object
    Get {
        bucket: String,
        key: String,
        #[arg(long)]
        version_id: Option<String>,
        /// Output file path, stdout when absent
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Delete an object or one of its versions
    Rm {
        bucket: String,
        key: String,
        #[arg(long)]
        version_id: Option<String>,
    },

    /// List object versions and delete markers
    Versions {
        bucket: String,
        #[arg(short, long)]
        prefix: Option<String>,
        /// Resume after this key (NextKeyMarker of the previous page)
        #[arg(long)]
        key_marker: Option<String>,
        /// Resume after this version (NextVersionIdMarker of the previous page)
        #[arg(long)]
        version_id_marker: Option<String>,
        #[arg(long)]
        max_keys: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
enum VersioningCommands {
    Get { bucket: String },
    Enable { bucket: String },
    Suspend { bucket: String },
}

struct StoreClient {
    http: Client,
    base: Url,
    access_key: Option<String>,
}

impl StoreClient {
    fn new(url: &str, access_key: Option<String>) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            base: Url::parse(url).with_context(|| format!("Invalid server URL: {}", url))?,
            access_key,
        })
    }

    fn url(&self, bucket: &str, key: Option<&str>) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("Server URL cannot be a base"))?;
            segments.pop_if_empty().push(bucket);
            if let Some(key) = key {
                segments.extend(key.split('/'));
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.http.request(method, url);
        match &self.access_key {
            Some(key) => request.header("authorization", format!("AWS {}:unsigned", key)),
            None => request,
        }
    }
}

async fn check(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    bail!("Request failed with {}:\n{}", status, body)
}

fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

fn versioning_body(status: &str) -> String {
    format!(
        r#"<VersioningConfiguration xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Status>{}</Status></VersioningConfiguration>"#,
        status
    )
}

async fn run(cli: Cli) -> Result<()> {
    let client = StoreClient::new(&cli.url, cli.access_key)?;

    match cli.command {
        Commands::Mb { bucket, acl } => {
            let mut request = client.request(Method::PUT, client.url(&bucket, None)?);
            if let Some(acl) = acl {
                request = request.header("x-amz-acl", acl);
            }
            check(request.send().await?).await?;
            println!("Created bucket {}", bucket);
        }
        Commands::Versioning { command } => {
            let (bucket, status) = match command {
                VersioningCommands::Get { bucket } => (bucket, None),
                VersioningCommands::Enable { bucket } => (bucket, Some("Enabled")),
                VersioningCommands::Suspend { bucket } => (bucket, Some("Suspended")),
            };
            let mut url = client.url(&bucket, None)?;
            url.set_query(Some("versioning"));

            let response = match status {
                Some(status) => {
                    client
                        .request(Method::PUT, url)
                        .body(versioning_body(status))
                        .send()
                        .await?
                }
                None => client.request(Method::GET, url).send().await?,
            };
            let response = check(response).await?;
            match status {
                Some(status) => println!("Versioning {} on {}", status, bucket),
                None => println!("{}", response.text().await?),
            }
        }
        Commands::Put {
            bucket,
            key,
            file,
            content_type,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file))?;
            let mut request = client
                .request(Method::PUT, client.url(&bucket, Some(&key))?)
                .body(data);
            if let Some(content_type) = content_type {
                request = request.header("content-type", content_type);
            }
            let response = check(request.send().await?).await?;
            println!(
                "Uploaded {}/{} etag={} version={}",
                bucket,
                key,
                header(&response, "etag").unwrap_or("-"),
                header(&response, VERSION_ID_HEADER).unwrap_or("-"),
            );
        }
        Commands::Get {
            bucket,
            key,
            version_id,
            output,
        } => {
            let mut url = client.url(&bucket, Some(&key))?;
            if let Some(version_id) = version_id {
                url.query_pairs_mut().append_pair("versionId", &version_id);
            }
            let response = check(client.request(Method::GET, url).send().await?).await?;
            let version = header(&response, VERSION_ID_HEADER).map(str::to_string);
            let data = response.bytes().await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &data)
                        .await
                        .with_context(|| format!("Failed to write {}", path))?;
                    eprintln!(
                        "Wrote {} bytes to {} (version {})",
                        data.len(),
                        path,
                        version.as_deref().unwrap_or("-")
                    );
                }
                None => print!("{}", String::from_utf8_lossy(&data)),
            }
        }
        Commands::Rm {
            bucket,
            key,
            version_id,
        } => {
            let mut url = client.url(&bucket, Some(&key))?;
            if let Some(version_id) = version_id {
                url.query_pairs_mut().append_pair("versionId", &version_id);
            }
            let response = check(client.request(Method::DELETE, url).send().await?).await?;
            println!(
                "Deleted {}/{} delete_marker={} version={}",
                bucket,
                key,
                header(&response, DELETE_MARKER_HEADER).unwrap_or("false"),
                header(&response, VERSION_ID_HEADER).unwrap_or("-"),
            );
        }
        Commands::Versions {
            bucket,
            prefix,
            key_marker,
            version_id_marker,
            max_keys,
        } => {
            let mut url = client.url(&bucket, None)?;
            url.set_query(Some("versions"));
            {
                let mut pairs = url.query_pairs_mut();
                if let Some(prefix) = &prefix {
                    pairs.append_pair("prefix", prefix);
                }
                if let Some(key_marker) = &key_marker {
                    pairs.append_pair("key-marker", key_marker);
                }
                if let Some(version_id_marker) = &version_id_marker {
                    pairs.append_pair("version-id-marker", version_id_marker);
                }
                if let Some(max_keys) = max_keys {
                    pairs.append_pair("max-keys", &max_keys.to_string());
                }
            }
            let response = check(client.request(Method::GET, url).send().await?).await?;
            println!("{}", response.text().await?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    run(Cli::parse()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url_keeps_key_segments() {
        let client = StoreClient::new("http://localhost:3000", None).unwrap();
        let url = client.url("photos", Some("2024/cat picture.png")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/photos/2024/cat%20picture.png");
    }

    #[test]
    fn test_rm_parsing() {
        let cli = Cli::parse_from([
            "versioned-store-cli",
            "rm",
            "photos",
            "cat.png",
            "--version-id",
            "null",
        ]);
        match cli.command {
            Commands::Rm { version_id, .. } => assert_eq!(version_id.as_deref(), Some("null")),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
