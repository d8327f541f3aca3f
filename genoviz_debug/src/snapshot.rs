// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON dumps of a scene's element tree.
//!
//! Only local properties are written; world transforms and effective
//! opacity are derived and can be recomputed from the tree.

use std::io::{self, Write};

use genoviz_core::scene::{ElementId, SceneStore, Shape, Style};
use serde_json::{Map, Value, json};

const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Returns every root of `store` and its descendants as a JSON array.
#[must_use]
pub fn scene_snapshot(store: &SceneStore) -> Value {
    Value::Array(
        store
            .roots()
            .into_iter()
            .map(|root| element(store, root))
            .collect(),
    )
}

/// Writes [`scene_snapshot`] as pretty-printed JSON.
pub fn write_snapshot(store: &SceneStore, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, &scene_snapshot(store))?;
    Ok(())
}

fn element(store: &SceneStore, id: ElementId) -> Value {
    let mut out = Map::new();
    out.insert("id".into(), json!(id.index()));
    out.insert("shape".into(), shape(store.shape(id)));

    let transform = store.local_transform(id).as_coeffs();
    if transform != IDENTITY {
        out.insert("transform".into(), json!(transform));
    }
    let opacity = store.local_opacity(id);
    if opacity < 1.0 {
        out.insert("opacity".into(), json!(opacity));
    }
    if store.is_hidden(id) {
        out.insert("hidden".into(), Value::Bool(true));
    }
    if !matches!(store.shape(id), Shape::Group) {
        out.insert("style".into(), style(store.style(id)));
    }

    let children: Vec<Value> = store
        .children(id)
        .map(|child| element(store, child))
        .collect();
    if !children.is_empty() {
        out.insert("children".into(), Value::Array(children));
    }
    Value::Object(out)
}

fn shape(shape: &Shape) -> Value {
    match shape {
        Shape::Group => json!({ "kind": "group" }),
        Shape::Rect(r) => json!({
            "kind": "rect",
            "x": r.x0,
            "y": r.y0,
            "width": r.width(),
            "height": r.height(),
        }),
        Shape::Circle { center, radius } => json!({
            "kind": "circle",
            "cx": center.x,
            "cy": center.y,
            "r": radius,
        }),
        Shape::Line(l) => json!({
            "kind": "line",
            "from": [l.p0.x, l.p0.y],
            "to": [l.p1.x, l.p1.y],
        }),
        Shape::Path(p) => json!({ "kind": "path", "d": p.to_svg() }),
        Shape::Text { origin, content } => json!({
            "kind": "text",
            "x": origin.x,
            "y": origin.y,
            "content": content,
        }),
    }
}

fn style(style: &Style) -> Value {
    let mut out = Map::new();
    if let Some(fill) = style.fill {
        out.insert("fill".into(), json!(fill.to_hex()));
    }
    if let Some(stroke) = style.stroke {
        out.insert("stroke".into(), json!(stroke.to_hex()));
        out.insert("strokeWidth".into(), json!(style.stroke_width));
    }
    if let Some(class) = &style.class {
        out.insert("class".into(), json!(class));
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use genoviz_core::color::Color;

    use super::*;

    fn point(x: f64, y: f64) -> Shape {
        Shape::Circle {
            center: (x, y).into(),
            radius: 4.0,
        }
    }

    #[test]
    fn nested_elements_are_written_depth_first() {
        let mut store = SceneStore::new();
        let root = store.create_element();
        let layer = store.create_child(root, Shape::Group, Style::default());
        store.create_child(
            layer,
            point(10.0, 20.0),
            Style::fill(Color::rgb(0x3c, 0x55, 0x9a)).with_class("node"),
        );
        store.set_opacity(layer, 0.5);

        let snapshot = scene_snapshot(&store);
        let layer = &snapshot[0]["children"][0];
        assert_eq!(layer["shape"]["kind"], "group");
        assert_eq!(layer["opacity"], 0.5);
        assert!(layer.get("style").is_none(), "groups carry no style");

        let node = &layer["children"][0];
        assert_eq!(node["shape"]["cx"], 10.0);
        assert_eq!(node["style"]["fill"], "#3c559a");
        assert_eq!(node["style"]["class"], "node");
        assert!(node.get("transform").is_none());
    }

    #[test]
    fn write_snapshot_emits_parseable_json() {
        let mut store = SceneStore::new();
        let root = store.create_element();
        let text = store.create_child(
            root,
            Shape::Text {
                origin: (1.0, 2.0).into(),
                content: "chr1".into(),
            },
            Style::default(),
        );
        store.set_hidden(text, true);

        let mut out = Vec::new();
        write_snapshot(&store, &mut out).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["children"][0]["shape"]["content"], "chr1");
        assert_eq!(parsed[0]["children"][0]["hidden"], true);
    }
}
