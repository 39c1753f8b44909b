use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use markup5ever_rcdom::{Handle, SerializableHandle};

/// 序列化节点的全部子节点（相当于 innerHTML）
pub fn serialize_children(node: &Handle) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = node.clone().into();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };

    if let Err(e) = serialize(&mut buf, &serializable, opts) {
        tracing::warn!("序列化片段失败: {}", e);
    }

    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::fragment_to_dom;

    #[test]
    fn test_inner_html_escapes_text() {
        let (_dom, body) = fragment_to_dom("<em>a</em> &lt; b");
        assert_eq!(serialize_children(&body), "<em>a</em> &lt; b");
    }
}
