//! CLI command implementations

use anyhow::{Result, bail};
use colored::Colorize;
use nodetree_core::{
    ChildListing, Config, Locale, NodeView, Projection, Store, TreeEngine, TreeView,
    context::parse_timezone,
};
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Global output options
pub struct Display {
    pub json: bool,
    pub lang: Option<String>,
    pub tz: Option<String>,
}

impl Display {
    fn locale(&self, config: &Config) -> Result<Locale> {
        match &self.lang {
            Some(lang) => Locale::parse(lang)
                .ok_or_else(|| anyhow::anyhow!("Invalid language code: {}", lang)),
            None => Ok(config.locale()),
        }
    }

    fn projection(&self, config: &Config) -> Result<Projection> {
        let tz = self.tz.as_deref().unwrap_or(&config.default_timezone);
        Ok(Projection::new(self.locale(config)?, parse_timezone(tz)?))
    }
}

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Parent")]
    parent: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

impl From<&NodeView> for NodeRow {
    fn from(view: &NodeView) -> Self {
        Self {
            id: view.id,
            parent: view.parent.map_or_else(|| "-".to_string(), |p| p.to_string()),
            title: view.title.clone(),
            created_at: view.created_at.clone(),
        }
    }
}

fn load_config(store: &Store) -> Result<Config> {
    Ok(match store.config_path() {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    })
}

fn open() -> Result<(TreeEngine<Store>, Config)> {
    let store = Store::open()?;
    let config = load_config(&store)?;
    tracing::debug!(nodes = store.len(), "opened store");
    let engine = TreeEngine::new(store).with_max_depth(config.max_depth);
    Ok((engine, config))
}

fn print_table(views: &[NodeView]) {
    let rows: Vec<NodeRow> = views.iter().map(NodeRow::from).collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

/// Indented lines for a nested listing
fn render_tree(nodes: &[TreeView]) -> Vec<String> {
    fn walk(nodes: &[TreeView], prefix: &str, lines: &mut Vec<String>) {
        for (i, tree) in nodes.iter().enumerate() {
            let last = i + 1 == nodes.len();
            let branch = if last { "└── " } else { "├── " };
            lines.push(format!(
                "{}{}{} {} ({})",
                prefix, branch, tree.node.id, tree.node.title, tree.node.created_at
            ));
            let next = format!("{}{}", prefix, if last { "    " } else { "│   " });
            walk(&tree.children, &next, lines);
        }
    }

    let mut lines = Vec::new();
    walk(nodes, "", &mut lines);
    lines
}

pub fn init() -> Result<()> {
    let store = Store::init(std::env::current_dir()?)?;
    let dir = store
        .data_dir()
        .map(|d| d.display().to_string())
        .unwrap_or_default();
    println!("{} Initialized nodetree in {}", "✓".green(), dir);
    Ok(())
}

pub fn create(parent: Option<u64>, display: &Display) -> Result<()> {
    let (mut engine, config) = open()?;
    let view = engine.create_node(parent, &display.locale(&config)?)?;

    if display.json {
        println!("{}", serde_json::to_string(&view)?);
    } else {
        println!("{} Created node: {}", "✓".green(), view.id.to_string().cyan());
        println!("  Title:  {}", view.title);
        if let Some(parent) = view.parent {
            println!("  Parent: {}", parent);
        }
        println!("  Created: {} UTC", view.created_at);
    }
    Ok(())
}

pub fn roots(display: &Display) -> Result<()> {
    let (engine, config) = open()?;
    let roots = engine.list_roots(&display.projection(&config)?)?;

    if display.json {
        println!("{}", serde_json::to_string(&roots)?);
    } else if roots.is_empty() {
        println!("No root nodes");
    } else {
        print_table(&roots);
    }
    Ok(())
}

pub fn children(id: u64, depth: Option<i64>, display: &Display) -> Result<()> {
    let (engine, config) = open()?;
    let listing = engine.list_children(id, depth, &display.projection(&config)?)?;

    if display.json {
        println!("{}", serde_json::to_string(&listing)?);
        return Ok(());
    }

    match listing {
        ChildListing::Flat(views) if views.is_empty() => println!("Node {} has no children", id),
        ChildListing::Flat(views) => print_table(&views),
        ChildListing::Tree(trees) => {
            println!("{}", id.to_string().cyan().bold());
            for line in render_tree(&trees) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

pub fn delete(id: u64, display: &Display) -> Result<()> {
    let (mut engine, _) = open()?;
    let outcome = engine.delete_node(id)?;

    if display.json {
        println!("{}", serde_json::to_string(&outcome)?);
    }
    if !outcome.success {
        bail!("{} (node {})", outcome.message, id);
    }
    if !display.json {
        println!("{} Deleted node {}", "✓".green(), id);
    }
    Ok(())
}

pub fn seed(display: &Display) -> Result<()> {
    let (mut engine, _) = open()?;
    let created = nodetree_core::seed::seed(&mut engine)?;

    if display.json {
        println!("{}", serde_json::json!({ "created": created }));
    } else if created == 0 {
        println!("{} Sample tree already present", "!".yellow());
    } else {
        println!("{} Seeded {} nodes", "✓".green(), created);
    }
    Ok(())
}

/// Show current configuration
pub fn config_show(display: &Display) -> Result<()> {
    let config = load_config(&Store::open()?)?;

    if display.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("{}", "Current configuration:".bold());
        println!();
        println!("default_locale = \"{}\"", config.default_locale);
        println!("default_timezone = \"{}\"", config.default_timezone);
        println!("max_depth = {}", config.max_depth);
        println!();
        println!("[server]");
        println!("host = \"{}\"", config.server.host);
        println!("port = {}", config.server.port);
    }
    Ok(())
}

/// Reset configuration to defaults
pub fn config_reset() -> Result<()> {
    let store = Store::open()?;
    let Some(path) = store.config_path() else {
        bail!("Store has no configuration file");
    };
    std::fs::write(&path, Config::default_with_comments())?;

    println!("{} Configuration reset to defaults", "✓".green());
    Ok(())
}
