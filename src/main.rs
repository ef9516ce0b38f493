use core_types::Rect;
use dom::{Document, DomError, NodeId};
use host::{Page, PageConfig};
use keyboard::{KeyboardConfig, KeyboardError};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

struct DemoTree {
    app: NodeId,
    name: NodeId,
    brightness: NodeId,
}

/// `<home-assistant>` with a settings card two shadow roots down holding a
/// text field and a number field.
fn build_tree(doc: &mut Document) -> Result<DemoTree, DomError> {
    let body = doc.body();
    let app = doc.create_element("home-assistant");
    doc.append_child(body, app)?;
    let app_root = doc.attach_shadow(app)?;

    let panel = doc.create_element("ha-panel-config");
    doc.append_child(app_root, panel)?;
    let panel_root = doc.attach_shadow(panel)?;

    let card = doc.create_element("ha-card");
    doc.append_child(panel_root, card)?;

    let name = doc.create_element_with("input", &[("type", "text")]);
    doc.append_child(card, name)?;
    doc.set_rect(name, Rect::new(40.0, 120.0, 320.0, 32.0))?;

    let brightness = doc.create_element_with("input", &[("type", "number")]);
    doc.append_child(card, brightness)?;
    doc.set_rect(brightness, Rect::new(1100.0, 180.0, 80.0, 32.0))?;

    Ok(DemoTree {
        app,
        name,
        brightness,
    })
}

fn main() -> Result<(), KeyboardError> {
    let _ = env_logger::try_init();

    let config = KeyboardConfig::load();
    let mut page = Page::new(PageConfig::default(), &config)?;
    let tree = page.mutate(build_tree)?;
    let found = page.attach_keyboard(tree.app)?;
    log::info!("keyboard attached, {found} input(s) registered");

    page.focus(tree.name);
    page.advance(500);
    for key in ["K", "i", "t", "c", "h", "e", "n"] {
        page.press_key(key);
    }
    log::info!(
        "name = {:?}, keyboard {:?}",
        page.doc().value(tree.name).unwrap_or_default(),
        page.keyboard().current().placement
    );

    page.focus(tree.brightness);
    page.advance(1000);
    for key in ["8", "0"] {
        page.press_key(key);
    }
    log::info!(
        "brightness = {:?}, keyboard {:?}",
        page.doc().value(tree.brightness).unwrap_or_default(),
        page.keyboard().current().placement
    );

    page.blur();
    page.settle();

    for transition in page.take_transitions() {
        log::info!("{:?} -> {:?}", transition.from, transition.to);
    }
    for line in dom::debug::outline(page.doc(), page.doc().root()) {
        log::debug!("{line}");
    }
    Ok(())
}
