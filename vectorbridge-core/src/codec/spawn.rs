//! `<Spawn>` codec

use super::{
    clean_name, element_name, read_position, read_selection, write_position, write_selection,
    ReadContext, WriteContext, MARK_SPRITE,
};
use crate::scene::{Element, NodeId, Scene, SceneNode, SpawnData, Visual, DEFAULT_SPAWN_ANIMATION};
use crate::units::parse_string_or;
use crate::xml::XmlNode;

pub fn write(ctx: &WriteContext<'_>, id: NodeId, data: &SpawnData) -> XmlNode {
    let node = ctx.scene.node(id);

    let mut xml = XmlNode::new("Spawn");
    write_position(&mut xml, ctx.position(id));
    xml.set_attr("Name", clean_name(&node.name));
    xml.set_attr(
        "Animation",
        parse_string_or(Some(data.animation.as_str()), DEFAULT_SPAWN_ANIMATION),
    );
    write_selection(&mut xml, node);
    xml
}

pub fn read(
    ctx: &mut ReadContext<'_>,
    scene: &mut Scene,
    parent: Option<NodeId>,
    xml: &XmlNode,
) -> Option<NodeId> {
    let data = SpawnData {
        animation: parse_string_or(xml.attr("Animation"), DEFAULT_SPAWN_ANIMATION),
    };

    let visual = Visual::new(MARK_SPRITE, ctx.lookup_visual(MARK_SPRITE));
    let mut node = SceneNode::tagged(element_name(xml, "Spawn"), Element::Spawn(data))
        .at(read_position(xml))
        .with_visual(visual);
    read_selection(xml, &mut node);

    Some(ctx.spawn(scene, parent, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NoTemplates, VisualManifest};
    use crate::export::ExportMode;
    use crate::scene::SelectionVariant;

    fn read_one(xml: &XmlNode) -> (Scene, NodeId) {
        let manifest = VisualManifest::default();
        let mut ctx = ReadContext::new(&manifest, &NoTemplates);
        let mut scene = Scene::new();
        let id = read(&mut ctx, &mut scene, None, xml).unwrap();
        (scene, id)
    }

    #[test]
    fn test_default_animation_on_read() {
        for xml in [
            XmlNode::new("Spawn").with_attr("Name", "DefaultSpawn"),
            XmlNode::new("Spawn").with_attr("Animation", "  "),
        ] {
            let (scene, id) = read_one(&xml);
            assert_eq!(
                scene.node(id).element(),
                Some(&Element::Spawn(SpawnData { animation: "JumpOff|18".into() }))
            );
        }
    }

    #[test]
    fn test_write_blank_animation() {
        let mut scene = Scene::new();
        let data = SpawnData { animation: String::new() };
        let mut node = SceneNode::tagged("Respawn (2)", Element::Spawn(data.clone()));
        node.selection = Some(SelectionVariant::HunterMode);
        let id = scene.add_root(node);

        let xml = write(&WriteContext::new(&scene, ExportMode::Level), id, &data);
        let keys: Vec<_> = xml.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["X", "Y", "Name", "Animation"]);
        assert_eq!(xml.attr("Name"), Some("Respawn"));
        assert_eq!(xml.attr("Animation"), Some("JumpOff|18"));

        let (imported, back) = read_one(&xml);
        assert_eq!(imported.node(back).name, "Respawn");
        assert_eq!(imported.node(back).selection, Some(SelectionVariant::HunterMode));
    }
}
