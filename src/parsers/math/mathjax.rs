use super::{tex_annotation, wrap_formula};
use crate::parsers::html::FragmentTree;

const PREVIEW_CLASS: &str = "MathJax_Preview";
const FRAME_CLASS: &str = "MathJax";

/// `script[type^="math/tex"]`，包括 `math/tex; mode=display`
pub fn is_tex_script<T: FragmentTree>(tree: &T, node: &T::Node) -> bool {
    tree.is_element(node, "script")
        && tree
            .attr(node, "type")
            .map(|t| t.trim().to_ascii_lowercase().starts_with("math/tex"))
            .unwrap_or(false)
}

/// 恢复 MathJax 公式
///
/// 一个公式由预览节点、渲染帧（id 为 `<脚本id>-Frame`）和源码脚本三部分组成。
/// 以源码脚本为准，预览和渲染帧直接丢弃；没有脚本的渲染帧再尝试内嵌的脚本或 TeX 注解。
pub fn recover<T: FragmentTree>(tree: &T) -> usize {
    let root = tree.root();
    let mut count = 0;

    let scripts = tree.find_all(&root, &|n| is_tex_script(tree, n));
    for script in scripts {
        if !tree.is_attached(&script) {
            continue;
        }

        if let Some(id) = tree.attr(&script, "id").filter(|id| !id.is_empty()) {
            let frame_id = format!("{}-Frame", id);
            for frame in tree.find_all(&root, &|n| tree.attr(n, "id").as_deref() == Some(frame_id.as_str())) {
                remove_preceding_preview(tree, &frame);
                tree.remove(&frame);
            }
        }
        remove_preceding_preview(tree, &script);

        let source = tree.read_text(&script);
        if source.trim().is_empty() {
            tree.remove(&script);
        } else if tree.replace_with_text(&script, &wrap_formula(&source)) {
            count += 1;
        }
    }

    // 选区没有包含源码脚本时，只剩下渲染帧
    let frames = tree.find_all(&root, &|n| tree.has_class(n, FRAME_CLASS));
    for frame in frames {
        if !tree.is_attached(&frame) {
            continue;
        }

        let source = tree
            .find_first(&frame, &|n| is_tex_script(tree, n))
            .map(|script| tree.read_text(&script))
            .filter(|text| !text.trim().is_empty())
            .or_else(|| tex_annotation(tree, &frame));

        if let Some(source) = source {
            remove_preceding_preview(tree, &frame);
            if tree.replace_with_text(&frame, &wrap_formula(&source)) {
                count += 1;
            }
        }
    }

    count
}

/// 删除紧挨在节点之前的预览节点（中间只允许空白文本）
fn remove_preceding_preview<T: FragmentTree>(tree: &T, node: &T::Node) {
    let mut current = tree.previous_sibling(node);

    while let Some(sibling) = current {
        if tree.is_text(&sibling) && tree.read_text(&sibling).trim().is_empty() {
            current = tree.previous_sibling(&sibling);
            continue;
        }
        if tree.has_class(&sibling, PREVIEW_CLASS) {
            tree.remove(&sibling);
        }
        break;
    }
}
