// servicli.rs
// City catalog of the ServiCli courier API, used to name cities that
// documents reference only by code.

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::{config::Config, contifico::text_or_number};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicliCiudad {
    #[serde(default, deserialize_with = "text_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
}

impl ServicliCiudad {
    pub fn codigo(&self) -> Option<i32> {
        self.id.as_deref()?.trim().parse().ok()
    }
}

#[derive(Clone)]
pub struct ServicliClient {
    http: reqwest::Client,
    uri: String,
    user: String,
    pass: String,
}

impl ServicliClient {
    /// `None` unless the endpoint and both credentials are configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        Some(ServicliClient {
            http: reqwest::Client::new(),
            uri: config.servicli_uri.clone()?,
            user: config.servicli_user.clone()?,
            pass: config.servicli_pass.clone()?,
        })
    }

    /// The credentials travel as a `['user','pass']` suffix of the URL.
    fn cities_url(&self) -> String {
        format!("{}['{}','{}']", self.uri, self.user, self.pass)
    }

    pub async fn fetch_cities(&self) -> Result<Vec<ServicliCiudad>> {
        let res = self
            .http
            .get(self.cities_url())
            .send()
            .await
            .context("servicli request failed")?;

        let status = res.status();
        if !status.is_success() {
            bail!("servicli answered {status}");
        }
        res.json::<Vec<ServicliCiudad>>()
            .await
            .context("servicli payload is not a city list")
    }
}
