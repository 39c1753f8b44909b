use super::{wrap_formula, TEX_ENCODING};
use crate::parsers::html::{is_blank, FragmentTree};

const KATEX_CLASS: &str = "katex";
const MATHML_CLASS: &str = "katex-mathml";

/// 恢复 KaTeX 公式
///
/// 先向上找到只包着这个公式的最外层 `span`/`var`，再把紧邻的同类兄弟节点
/// 视为同一公式被拆开的片段，按文档顺序用空格拼接源码后整体替换为一个文本节点。
pub fn recover<T: FragmentTree>(tree: &T) -> usize {
    let root = tree.root();
    let nodes = tree.find_all(&root, &|n| tree.has_class(n, KATEX_CLASS));
    let mut count = 0;

    for node in nodes {
        if !tree.is_attached(&node) || katex_source(tree, &node).is_none() {
            continue;
        }

        let container = find_container(tree, &node);
        let mut run = vec![container.clone()];
        let mut next = tree.next_sibling(&container);
        while let Some(sibling) = next {
            if !is_katex_node(tree, &sibling) {
                break;
            }
            next = tree.next_sibling(&sibling);
            run.push(sibling);
        }

        let sources: Vec<String> = run
            .iter()
            .filter_map(|member| katex_source(tree, member))
            .map(|source| source.trim().to_string())
            .collect();

        for member in &run[1..] {
            tree.remove(member);
        }
        if tree.replace_with_text(&container, &wrap_formula(&sources.join(" "))) {
            count += 1;
        }
    }

    count
}

/// `.katex-mathml` 中的 TeX 注解
fn katex_source<T: FragmentTree>(tree: &T, scope: &T::Node) -> Option<String> {
    let mathml = if tree.has_class(scope, MATHML_CLASS) {
        scope.clone()
    } else {
        tree.find_first(scope, &|n| tree.has_class(n, MATHML_CLASS))?
    };

    tree.find_first(&mathml, &|n| {
        tree.is_element(n, "annotation") && tree.attr(n, "encoding").as_deref() == Some(TEX_ENCODING)
    })
    .map(|annotation| tree.read_text(&annotation))
    .filter(|text| !text.trim().is_empty())
}

/// 节点本身是或包含 `.katex`
fn is_katex_node<T: FragmentTree>(tree: &T, node: &T::Node) -> bool {
    tree.local_name(node).is_some()
        && (tree.has_class(node, KATEX_CLASS)
            || tree.find_first(node, &|n| tree.has_class(n, KATEX_CLASS)).is_some())
}

/// 向上穿过只包着当前节点的 `span`/`var`
fn find_container<T: FragmentTree>(tree: &T, node: &T::Node) -> T::Node {
    let root = tree.root();
    let mut container = node.clone();

    while let Some(parent) = tree.parent(&container) {
        if tree.same_node(&parent, &root) {
            break;
        }
        if !(tree.is_element(&parent, "span") || tree.is_element(&parent, "var")) {
            break;
        }

        let only_child = tree.children(&parent).iter().all(|child| {
            tree.same_node(child, &container)
                || (tree.is_text(child) && is_blank(&tree.read_text(child)))
        });
        if !only_child {
            break;
        }

        container = parent;
    }

    container
}
