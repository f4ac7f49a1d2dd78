// src/bin/demo.rs
// Walks through the three lookups against a running places-lookup service:
// nearby search, place by id, place photo.

use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::process;
use std::time::{Duration, Instant};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

const TEST_PLACE_ID: &str = "ChIJWV3PC2PzT0YR-_gAuGdqTNQ";

#[derive(Deserialize, Debug)]
struct PlaceView {
    id: String,
    name: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct NearbyView {
    count: usize,
    places: Vec<PlaceView>,
}

struct DemoRunner {
    base_url: String,
    client: Client,
}

impl DemoRunner {
    fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { base_url, client })
    }

    async fn check_service_health(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn get_nearby(&self, lat: f64, lng: f64) -> Result<NearbyView> {
        let response = self
            .client
            .get(format!("{}/places/nearby", self.base_url))
            .query(&[("lat", lat), ("lng", lng)])
            .send()
            .await?;
        Self::json_or_error(response).await
    }

    async fn get_place(&self, place_id: &str) -> Result<PlaceView> {
        let response = self
            .client
            .get(format!("{}/places/{}", self.base_url, place_id))
            .send()
            .await?;
        Self::json_or_error(response).await
    }

    async fn get_photo(&self, place_id: &str) -> Result<(usize, Option<String>)> {
        let response = self
            .client
            .get(format!("{}/places/{}/photo", self.base_url, place_id))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP {} - {}", status, body);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        Ok((bytes.len(), content_type))
    }

    async fn json_or_error<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
        if response.status().is_success() {
            response
                .json::<T>()
                .await
                .context("Failed to parse response JSON")
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP {} - {}", status, body)
        }
    }

    async fn run(&self, lat: f64, lng: f64) -> bool {
        let mut ok = true;

        println!("\n{}[1/3] Get Places near {:.4},{:.4}{}", CYAN, lat, lng, RESET);
        let start = Instant::now();
        match self.get_nearby(lat, lng).await {
            Ok(nearby) => {
                println!(
                    "{}✅ {} places ({:.1}s){}",
                    GREEN,
                    nearby.count,
                    start.elapsed().as_secs_f64(),
                    RESET
                );
                for place in &nearby.places {
                    println!("   • {} ({}) [{}]", place.name, place.id, place.tags.join(", "));
                }
            }
            Err(e) => {
                ok = false;
                println!("{}❌ Nearby search failed: {}{}", RED, e, RESET);
            }
        }

        println!("\n{}[2/3] Get Place Info {}{}", CYAN, TEST_PLACE_ID, RESET);
        let start = Instant::now();
        match self.get_place(TEST_PLACE_ID).await {
            Ok(place) => println!(
                "{}✅ Place found: {}, ID: {}, Types: [{}] ({:.1}s){}",
                GREEN,
                place.name,
                place.id,
                place.tags.join(", "),
                start.elapsed().as_secs_f64(),
                RESET
            ),
            Err(e) => {
                ok = false;
                println!("{}❌ Place lookup failed: {}{}", RED, e, RESET);
            }
        }

        println!("\n{}[3/3] Get Place Image {}{}", CYAN, TEST_PLACE_ID, RESET);
        let start = Instant::now();
        match self.get_photo(TEST_PLACE_ID).await {
            Ok((size, content_type)) => println!(
                "{}✅ {} bytes ({}) ({:.1}s){}",
                GREEN,
                size,
                content_type.unwrap_or_else(|| "unknown type".to_string()),
                start.elapsed().as_secs_f64(),
                RESET
            ),
            Err(e) => {
                ok = false;
                println!("{}❌ Photo fetch failed: {}{}", RED, e, RESET);
            }
        }

        ok
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let base_url =
        env::var("PLACES_LOOKUP_URL").unwrap_or_else(|_| "http://127.0.0.1:8003".to_string());

    // Optional: lookup-demo <lat> <lng>
    let args: Vec<String> = env::args().skip(1).collect();
    let (lat, lng) = match args.as_slice() {
        [lat, lng] => (
            lat.parse::<f64>().context("latitude must be a number")?,
            lng.parse::<f64>().context("longitude must be a number")?,
        ),
        [] => (60.1699, 24.9384),
        _ => bail!("usage: lookup-demo [<lat> <lng>]"),
    };

    let runner = DemoRunner::new(base_url)?;

    println!("\n{}🔍 Checking service status...{}", CYAN, RESET);
    if !runner.check_service_health().await {
        println!("{}❌ Service unavailable.{}", RED, RESET);
        println!("{}Please ensure places-lookup is running (cargo run){}", YELLOW, RESET);
        process::exit(1);
    }
    println!("{}✅ Service available{}", GREEN, RESET);

    let ok = runner.run(lat, lng).await;

    if ok {
        println!("\n{}✨ All lookups completed{}", BOLD, RESET);
        Ok(())
    } else {
        println!("\n{}⚠️  Some lookups failed{}", YELLOW, RESET);
        process::exit(1);
    }
}
