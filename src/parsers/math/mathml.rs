use super::{is_valid_formula, tex_annotation, wrap_formula};
use crate::parsers::html::FragmentTree;

/// 恢复 `<math>` 元素
///
/// 依次尝试 TeX 注解、`alttext` 属性、文本内容；后两者要先通过读屏特征串过滤。
/// 三者都不可用时保留原节点。
pub fn recover<T: FragmentTree>(tree: &T) -> usize {
    let root = tree.root();
    let nodes = tree.find_all(&root, &|n| tree.is_element(n, "math"));
    let mut count = 0;

    for node in nodes {
        if !tree.is_attached(&node) {
            continue;
        }

        let source = tex_annotation(tree, &node)
            .or_else(|| {
                tree.attr(&node, "alttext")
                    .filter(|alt| !alt.trim().is_empty() && is_valid_formula(alt))
            })
            .or_else(|| {
                Some(tree.read_text(&node))
                    .filter(|text| !text.trim().is_empty() && is_valid_formula(text))
            });

        if let Some(source) = source {
            if tree.replace_with_text(&node, &wrap_formula(&source)) {
                count += 1;
            }
        }
    }

    count
}
