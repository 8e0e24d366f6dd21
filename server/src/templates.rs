// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use parking_lot::RwLock;
use tera::Tera;
use tracing::{debug, info};

/// The Tera engine holding every `*.html` file of the template directory.
///
/// Template names are paths relative to that directory, e.g. `tasks/list.html`.
#[derive(Clone)]
pub struct Templates {
    engine: Arc<RwLock<Tera>>,
    reload: bool,
}

impl Templates {
    pub fn load(dir: &Path, reload: bool) -> Result<Self> {
        let glob = format!("{}/**/*.html", dir.display());
        let tera = Tera::new(&glob).with_context(|| format!("Failed to parse templates in {}", dir.display()))?;

        let count = tera.get_template_names().count();
        if count == 0 {
            bail!("No templates found in {}", dir.display());
        }
        info!("Loaded {} templates from {}", count, dir.display());

        Ok(Self {
            engine: Arc::new(RwLock::new(tera)),
            reload,
        })
    }

    pub fn render(&self, name: &str, context: &tera::Context) -> Result<String> {
        if self.reload {
            debug!("Reloading templates before rendering {}", name);
            self.engine
                .write()
                .full_reload()
                .context("Failed to reload templates")?;
        }
        self.engine
            .read()
            .render(name, context)
            .with_context(|| format!("Failed to render template {name}"))
    }
}
