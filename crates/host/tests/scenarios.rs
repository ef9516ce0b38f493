//! Data-driven keyboard sessions: each `fixtures/*.toml` file declares a
//! page tree and a list of steps with expectations.

use core_types::Rect;
use dom::NodeId;
use host::{Page, PageConfig};
use keyboard::KeyboardConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct Scenario {
    description: String,
    #[serde(default)]
    nodes: Vec<NodeSpec>,
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct NodeSpec {
    name: String,
    tag: String,
    /// `body`, another node's name, or `<name>#shadow` for its shadow root.
    parent: String,
    #[serde(default)]
    shadow: bool,
    #[serde(rename = "type")]
    input_type: Option<String>,
    rect: Option<[f32; 4]>,
    /// Built detached; an `insert` step connects it later.
    #[serde(default)]
    deferred: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    Attach { root: String },
    Insert { node: String },
    Remove { node: String },
    Focus { node: String },
    Blur,
    Press { keys: Vec<String> },
    Type { node: String, value: String },
    Advance { ms: u64 },
    Settle,
    Expect(Expectation),
}

#[derive(Debug, Default, Deserialize)]
struct Expectation {
    visibility: Option<String>,
    side: Option<String>,
    layout: Option<String>,
    keyboard_layout: Option<String>,
    /// A node name, or `none`.
    active: Option<String>,
    shown: Option<bool>,
    node: Option<String>,
    value: Option<String>,
}

struct Session {
    page: Page,
    names: BTreeMap<String, NodeId>,
    shadows: BTreeMap<String, NodeId>,
    parents: BTreeMap<String, NodeId>,
}

impl Session {
    fn build(nodes: &[NodeSpec]) -> Result<Self, String> {
        let page = Page::new(PageConfig::default(), &KeyboardConfig::default())
            .map_err(|err| format!("page: {err}"))?;
        let mut session = Self {
            page,
            names: BTreeMap::new(),
            shadows: BTreeMap::new(),
            parents: BTreeMap::new(),
        };
        for spec in nodes {
            session.create(spec)?;
        }
        Ok(session)
    }

    fn create(&mut self, spec: &NodeSpec) -> Result<(), String> {
        let parent = self.resolve_parent(&spec.parent)?;
        let node = self.page.mutate(|doc| -> Result<NodeId, String> {
            let node = match &spec.input_type {
                Some(ty) => doc.create_element_with(&spec.tag, &[("type", ty.as_str())]),
                None => doc.create_element(&spec.tag),
            };
            if let Some([x, y, w, h]) = spec.rect {
                doc.set_rect(node, Rect::new(x, y, w, h))
                    .map_err(|err| format!("rect on {}: {err}", spec.name))?;
            }
            if !spec.deferred {
                doc.append_child(parent, node)
                    .map_err(|err| format!("append {}: {err}", spec.name))?;
            }
            Ok(node)
        })?;
        if spec.shadow {
            let root = self
                .page
                .mutate(|doc| doc.attach_shadow(node))
                .map_err(|err| format!("shadow on {}: {err}", spec.name))?;
            self.shadows.insert(spec.name.clone(), root);
        }
        self.names.insert(spec.name.clone(), node);
        self.parents.insert(spec.name.clone(), parent);
        Ok(())
    }

    fn resolve_parent(&self, name: &str) -> Result<NodeId, String> {
        if name == "body" {
            return Ok(self.page.doc().body());
        }
        match name.strip_suffix("#shadow") {
            Some(host) => self
                .shadows
                .get(host)
                .copied()
                .ok_or_else(|| format!("no shadow root on {host}")),
            None => self.node(name),
        }
    }

    fn node(&self, name: &str) -> Result<NodeId, String> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| format!("unknown node {name}"))
    }

    fn run(&mut self, step: &Step) -> Result<(), String> {
        match step {
            Step::Attach { root } => {
                let root = self.node(root)?;
                self.page
                    .attach_keyboard(root)
                    .map_err(|err| format!("attach: {err}"))?;
            }
            Step::Insert { node } => {
                let parent = self.parents[node];
                let node = self.node(node)?;
                self.page
                    .mutate(|doc| doc.append_child(parent, node))
                    .map_err(|err| format!("insert: {err}"))?;
            }
            Step::Remove { node } => {
                let node = self.node(node)?;
                self.page
                    .mutate(|doc| doc.remove(node))
                    .map_err(|err| format!("remove: {err}"))?;
            }
            Step::Focus { node } => {
                let node = self.node(node)?;
                self.page.focus(node);
            }
            Step::Blur => self.page.blur(),
            Step::Press { keys } => {
                for key in keys {
                    self.page.press_key(key);
                }
            }
            Step::Type { node, value } => {
                let node = self.node(node)?;
                self.page
                    .type_text(node, value)
                    .map_err(|err| format!("type: {err}"))?;
            }
            Step::Advance { ms } => self.page.advance(*ms),
            Step::Settle => {
                if !self.page.settle() {
                    return Err("page did not settle".to_string());
                }
            }
            Step::Expect(expect) => self.check(expect)?,
        }
        Ok(())
    }

    fn check(&self, expect: &Expectation) -> Result<(), String> {
        let kb = self.page.keyboard();
        let mut failures = Vec::new();
        let mut compare = |what: &str, expected: &Option<String>, actual: String| {
            if let Some(expected) = expected {
                if !expected.eq_ignore_ascii_case(&actual) {
                    failures.push(format!("{what}: expected {expected}, got {actual}"));
                }
            }
        };
        compare("visibility", &expect.visibility, format!("{:?}", kb.visibility()));
        compare("side", &expect.side, format!("{:?}", kb.current().placement.side));
        compare("layout", &expect.layout, format!("{:?}", kb.current().placement.layout));
        compare(
            "keyboard_layout",
            &expect.keyboard_layout,
            kb.facade().layout().mode_name().to_string(),
        );
        let active = match kb.active_input() {
            None => "none".to_string(),
            Some(id) => self
                .names
                .iter()
                .find(|(_, n)| **n == id)
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| format!("#{}", id.0)),
        };
        compare("active", &expect.active, active);
        if let Some(shown) = expect.shown {
            let actual = kb.is_shown(self.page.doc());
            if shown != actual {
                failures.push(format!("shown: expected {shown}, got {actual}"));
            }
        }
        if let Some(value) = &expect.value {
            let name = expect.node.as_deref().ok_or("value needs a node")?;
            let actual = self.page.doc().value(self.node(name)?).unwrap_or_default();
            if actual != value.as_str() {
                failures.push(format!("value of {name}: expected {value:?}, got {actual:?}"));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.join("; "))
        }
    }
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn load(path: &Path) -> Scenario {
    let text = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read fixture {path:?}: {err}"));
    toml::from_str(&text).unwrap_or_else(|err| panic!("failed to parse fixture {path:?}: {err}"))
}

fn run_scenario(scenario: &Scenario) -> Result<(), String> {
    let mut session = Session::build(&scenario.nodes)?;
    for (index, step) in scenario.steps.iter().enumerate() {
        session
            .run(step)
            .map_err(|err| format!("step {} ({step:?}) at t={}: {err}", index + 1, session.page.now()))?;
    }
    Ok(())
}

#[test]
fn keyboard_scenarios() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = fixtures_dir();
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .unwrap_or_else(|err| panic!("failed to list {dir:?}: {err}"))
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no scenarios found in {dir:?}");

    let mut failures = Vec::new();
    for path in &paths {
        let scenario = load(path);
        if let Err(message) = run_scenario(&scenario) {
            failures.push(format!(
                "{} ({}): {message}",
                path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
                scenario.description
            ));
        }
    }
    assert!(
        failures.is_empty(),
        "{} of {} scenario(s) failed:\n{}",
        failures.len(),
        paths.len(),
        failures.join("\n")
    );
}
