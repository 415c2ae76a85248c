//! Validate a navigation configuration and print what it resolves to.
//!
//! Usage: `navgate-check [config.json] [identity.json]`
//! The config path falls back to `NAVGATE_CONFIG`. With an identity file the
//! visible menu, the landing target and an audit of the identity are printed.

use anyhow::Context;

use navgate_auth::IdentityContext;
use navgate_navigation::{Navigation, NavigationConfig, select_landing};

fn main() -> anyhow::Result<()> {
    navgate_observability::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => NavigationConfig::from_path(&path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => NavigationConfig::from_env().context("loading configuration from environment")?,
    };
    let nav = Navigation::from_config(config).context("validating configuration")?;

    let routes: Vec<_> = nav
        .registry()
        .entries()
        .iter()
        .map(|e| serde_json::json!({ "key": e.key, "path": e.pattern.as_str() }))
        .collect();

    let mut report = serde_json::json!({
        "routes": routes,
        "menuNodes": nav.menu().len(),
        "paths": nav.paths(),
    });

    if let Some(identity_path) = args.next() {
        let raw = std::fs::read_to_string(&identity_path)
            .with_context(|| format!("reading identity from {identity_path}"))?;
        let identity: IdentityContext =
            serde_json::from_str(&raw).context("decoding identity record")?;

        report["audit"] = serde_json::to_value(nav.audit_identity(&identity))?;
        report["menu"] = serde_json::to_value(nav.visible_menu(&identity))?;
        report["landing"] =
            serde_json::to_value(select_landing(nav.registry(), nav.paths(), &identity, None))?;
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
