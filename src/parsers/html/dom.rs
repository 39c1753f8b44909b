use std::cell::RefCell;
use std::rc::Rc;

use html5ever::parse_document;
use html5ever::tendril::{StrTendril, TendrilSink};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

/// 将 HTML 片段解析到一个独立的文档中，返回文档和承载片段的 body 节点
///
/// 片段内容无论怎样闭合标签都会留在 body 内，因此 body 可以直接充当脱离页面的容器。
pub fn fragment_to_dom(fragment: &str) -> (RcDom, Handle) {
    let html = format!("<!DOCTYPE html><html><head></head><body>{}</body></html>", fragment);
    let dom = parse_document(RcDom::default(), Default::default()).one(html);

    let body = find_nodes(&dom.document, vec!["html", "body"])
        .into_iter()
        .next()
        .unwrap_or_else(|| dom.document.clone());

    (dom, body)
}

/// 查找指定路径的DOM节点
pub fn find_nodes(node: &Handle, node_names: Vec<&str>) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some(node_name) = node_names.first().copied() else {
        return found_nodes;
    };

    if node_names.len() == 1 {
        if let NodeData::Element { ref name, .. } = node.data {
            if &*name.local == node_name {
                found_nodes.push(node.clone());
            }
        }

        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
        }
    } else if let NodeData::Element { ref name, .. } = node.data {
        if &*name.local == node_name {
            let mut new_node_names = node_names;
            new_node_names.remove(0);
            found_nodes.append(&mut find_nodes(node, new_node_names));
        } else {
            for child_node in node.children.borrow().iter() {
                found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
            }
        }
    } else {
        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
        }
    }

    found_nodes
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 检查元素的 class 列表中是否包含指定类名
pub fn has_class(node: &Handle, class_name: &str) -> bool {
    get_node_attr(node, "class")
        .map(|classes| classes.split_ascii_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

/// 获取父节点
///
/// `parent` 字段是 `Cell<Option<Weak>>`，读取时必须取出再放回。
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    child.parent.set(weak);
    parent
}

/// 获取节点在父节点中的位置
fn index_in_parent(parent: &Handle, child: &Handle) -> Option<usize> {
    parent
        .children
        .borrow()
        .iter()
        .position(|c| Rc::ptr_eq(c, child))
}

/// 获取相邻的前一个兄弟节点
pub fn get_previous_sibling(node: &Handle) -> Option<Handle> {
    let parent = get_parent_node(node)?;
    let index = index_in_parent(&parent, node)?;
    if index == 0 {
        return None;
    }
    let sibling = parent.children.borrow().get(index - 1).cloned();
    sibling
}

/// 获取相邻的后一个兄弟节点
pub fn get_next_sibling(node: &Handle) -> Option<Handle> {
    let parent = get_parent_node(node)?;
    let index = index_in_parent(&parent, node)?;
    let sibling = parent.children.borrow().get(index + 1).cloned();
    sibling
}

/// 创建文本节点
pub fn create_text_node(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    })
}

/// 读取节点（含全部后代）的文本内容
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => {}
        _ => {
            for child in node.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

/// 覆盖文本节点的内容，非文本节点忽略
pub fn set_text(node: &Handle, text: &str) {
    if let NodeData::Text { contents } = &node.data {
        let mut contents = contents.borrow_mut();
        contents.clear();
        contents.push_slice(text);
    }
}

/// 用新节点替换旧节点，旧节点脱离文档树
pub fn replace_node(old: &Handle, new: Handle) -> bool {
    let Some(parent) = get_parent_node(old) else {
        return false;
    };
    let Some(index) = index_in_parent(&parent, old) else {
        return false;
    };

    new.parent.set(Some(Rc::downgrade(&parent)));
    parent.children.borrow_mut()[index] = new;
    old.parent.set(None);
    true
}

/// 将节点从文档树中移除
pub fn detach_node(node: &Handle) -> bool {
    let Some(parent) = get_parent_node(node) else {
        return false;
    };
    let Some(index) = index_in_parent(&parent, node) else {
        return false;
    };

    parent.children.borrow_mut().remove(index);
    node.parent.set(None);
    true
}

/// 追加子节点
pub fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// 判断节点是否仍挂在给定的根节点之下
pub fn is_descendant_of(node: &Handle, root: &Handle) -> bool {
    let mut current = node.clone();
    loop {
        if Rc::ptr_eq(&current, root) {
            return true;
        }
        match get_parent_node(&current) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
}
