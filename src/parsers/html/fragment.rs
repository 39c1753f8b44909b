//! 结构化片段树接口
//!
//! 提取器只依赖 [`FragmentTree`] 上的少量原语（查找、替换、读文本），
//! 浏览器中的真实 DOM 绑定和这里基于 `markup5ever_rcdom` 的实现都可以满足它。

use std::cell::Cell;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::dom::{
    append_child, create_text_node, detach_node, fragment_to_dom, get_next_sibling,
    get_node_attr, get_node_name, get_parent_node, get_previous_sibling, is_descendant_of,
    replace_node, set_text, text_content,
};
use super::serializer::serialize_children;

/// 可遍历、可修改的片段树
pub trait FragmentTree {
    type Node: Clone;

    /// 片段的根容器
    fn root(&self) -> Self::Node;

    /// 元素的本地名（小写），非元素返回 `None`
    fn local_name(&self, node: &Self::Node) -> Option<String>;

    /// 属性值
    fn attr(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn is_text(&self, node: &Self::Node) -> bool;

    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn previous_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    fn same_node(&self, a: &Self::Node, b: &Self::Node) -> bool;

    /// 节点及其后代的文本内容
    fn read_text(&self, node: &Self::Node) -> String;

    /// 覆盖文本节点内容
    fn set_text(&self, node: &Self::Node, text: &str);

    /// 用一个文本节点替换节点
    fn replace_with_text(&self, node: &Self::Node, text: &str) -> bool;

    /// 移除节点
    fn remove(&self, node: &Self::Node) -> bool;

    /// 节点的子树序列化结果
    fn inner_html(&self, node: &Self::Node) -> String;

    /// 用解析后的 HTML 替换节点的全部子节点
    fn set_inner_html(&self, node: &Self::Node, html: &str);

    /// 节点是否仍挂在根容器之下
    fn is_attached(&self, node: &Self::Node) -> bool;

    /// 按文档顺序查找 `scope` 的所有后代中满足条件的节点
    fn find_all(&self, scope: &Self::Node, predicate: &dyn Fn(&Self::Node) -> bool) -> Vec<Self::Node> {
        let mut found = Vec::new();
        let mut stack: Vec<Self::Node> = self.children(scope).into_iter().rev().collect();

        while let Some(node) = stack.pop() {
            if predicate(&node) {
                found.push(node.clone());
            }
            stack.extend(self.children(&node).into_iter().rev());
        }

        found
    }

    /// 第一个满足条件的后代
    fn find_first(&self, scope: &Self::Node, predicate: &dyn Fn(&Self::Node) -> bool) -> Option<Self::Node> {
        self.find_all(scope, predicate).into_iter().next()
    }

    fn has_class(&self, node: &Self::Node, class_name: &str) -> bool {
        self.attr(node, "class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class_name))
            .unwrap_or(false)
    }

    fn is_element(&self, node: &Self::Node, name: &str) -> bool {
        self.local_name(node).as_deref() == Some(name)
    }

    /// 所有文本节点
    fn text_nodes(&self) -> Vec<Self::Node> {
        let root = self.root();
        self.find_all(&root, &|n| self.is_text(n))
    }
}

/// 基于 rcdom 的片段实现
pub struct HtmlFragment {
    // 持有文档，保证节点的弱引用父指针有效
    _dom: RcDom,
    root: Handle,
}

impl HtmlFragment {
    /// 解析 HTML 片段
    pub fn parse(html: &str) -> Self {
        let (dom, root) = fragment_to_dom(html);
        Self { _dom: dom, root }
    }

    /// 整个片段的扁平文本
    pub fn text(&self) -> String {
        text_content(&self.root)
    }

    /// 整个片段的 HTML
    pub fn html(&self) -> String {
        serialize_children(&self.root)
    }
}

impl FragmentTree for HtmlFragment {
    type Node = Handle;

    fn root(&self) -> Handle {
        self.root.clone()
    }

    fn local_name(&self, node: &Handle) -> Option<String> {
        get_node_name(node).map(|name| name.to_ascii_lowercase())
    }

    fn attr(&self, node: &Handle, name: &str) -> Option<String> {
        get_node_attr(node, name)
    }

    fn is_text(&self, node: &Handle) -> bool {
        matches!(node.data, NodeData::Text { .. })
    }

    fn children(&self, node: &Handle) -> Vec<Handle> {
        node.children.borrow().clone()
    }

    fn parent(&self, node: &Handle) -> Option<Handle> {
        get_parent_node(node)
    }

    fn previous_sibling(&self, node: &Handle) -> Option<Handle> {
        get_previous_sibling(node)
    }

    fn next_sibling(&self, node: &Handle) -> Option<Handle> {
        get_next_sibling(node)
    }

    fn same_node(&self, a: &Handle, b: &Handle) -> bool {
        Rc::ptr_eq(a, b)
    }

    fn read_text(&self, node: &Handle) -> String {
        text_content(node)
    }

    fn set_text(&self, node: &Handle, text: &str) {
        set_text(node, text)
    }

    fn replace_with_text(&self, node: &Handle, text: &str) -> bool {
        replace_node(node, create_text_node(text))
    }

    fn remove(&self, node: &Handle) -> bool {
        detach_node(node)
    }

    fn inner_html(&self, node: &Handle) -> String {
        serialize_children(node)
    }

    fn set_inner_html(&self, node: &Handle, html: &str) {
        let (_dom, body) = fragment_to_dom(html);

        for child in node.children.borrow_mut().drain(..) {
            child.parent.set(None);
        }

        let parsed: Vec<Handle> = body.children.borrow_mut().drain(..).collect();
        for child in parsed {
            append_child(node, child);
        }
    }

    fn is_attached(&self, node: &Handle) -> bool {
        is_descendant_of(node, &self.root)
    }
}

/// 活动页面上的选区
pub trait SelectionRange {
    type Fragment: FragmentTree;

    /// 起点与终点重合（空选区）
    fn is_collapsed(&self) -> bool;

    /// 将选区内容克隆到脱离页面的容器中
    fn clone_contents(&self) -> Self::Fragment;

    /// 选区锚点是否仍在页面上
    fn is_attached(&self) -> bool;
}

/// 一个由 HTML 字符串描述的选区
///
/// 对应浏览器中的 `Range`：内容可以被克隆，锚点可能在之后被页面移除。
#[derive(Debug, Clone)]
pub struct HtmlSelection {
    html: String,
    attached: Rc<Cell<bool>>,
}

impl HtmlSelection {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            attached: Rc::new(Cell::new(true)),
        }
    }

    /// 模拟页面变更导致锚点被移除
    pub fn detach(&self) {
        self.attached.set(false);
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

impl SelectionRange for HtmlSelection {
    type Fragment = HtmlFragment;

    fn is_collapsed(&self) -> bool {
        self.html.is_empty()
    }

    fn clone_contents(&self) -> HtmlFragment {
        HtmlFragment::parse(&self.html)
    }

    fn is_attached(&self) -> bool {
        self.attached.get()
    }
}
