//! Response tree - collapsible, copyable rendering of JSON bodies
//!
//! [`render`] is a pure function from a decoded [`JsonNode`] to a
//! [`TreeNode`]. The tree owns the per-row collapse flags; [`TreeNode::lines`]
//! flattens whatever is currently visible for the UI. Copying a row rebuilds
//! its value from the tree, so collapse state never leaks into copied text.

use serde_json::{Map, Number, Value};

/// A decoded JSON value. Object members keep source order.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonNode {
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    Array(Vec<JsonNode>),
    Object(Vec<(String, JsonNode)>),
}

impl JsonNode {
    /// Decode text as JSON; `None` when it is not JSON
    pub fn parse(text: &str) -> Option<JsonNode> {
        serde_json::from_str::<Value>(text).ok().map(JsonNode::from)
    }

    pub fn to_value(&self) -> Value {
        match self {
            JsonNode::Null => Value::Null,
            JsonNode::Boolean(b) => Value::Bool(*b),
            JsonNode::Number(n) => Value::Number(n.clone()),
            JsonNode::String(s) => Value::String(s.clone()),
            JsonNode::Array(items) => Value::Array(items.iter().map(JsonNode::to_value).collect()),
            JsonNode::Object(members) => Value::Object(
                members
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }

    /// Child reached by following row indices
    pub fn at(&self, path: &[usize]) -> Option<&JsonNode> {
        let Some((&first, rest)) = path.split_first() else {
            return Some(self);
        };
        let child = match self {
            JsonNode::Array(items) => items.get(first)?,
            JsonNode::Object(members) => &members.get(first)?.1,
            _ => return None,
        };
        child.at(rest)
    }

    /// Literal JSON text of a primitive
    fn literal(&self) -> String {
        serde_json::to_string(&self.to_value()).unwrap_or_default()
    }
}

impl From<Value> for JsonNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => JsonNode::Null,
            Value::Bool(b) => JsonNode::Boolean(b),
            Value::Number(n) => JsonNode::Number(n),
            Value::String(s) => JsonNode::String(s),
            Value::Array(items) => JsonNode::Array(items.into_iter().map(JsonNode::from).collect()),
            Value::Object(map) => {
                JsonNode::Object(map.into_iter().map(|(k, v)| (k, JsonNode::from(v))).collect())
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    Array,
    Object,
}

impl Container {
    pub fn open(&self) -> &'static str {
        match self {
            Container::Array => "[",
            Container::Object => "{",
        }
    }

    pub fn close(&self) -> &'static str {
        match self {
            Container::Array => "]",
            Container::Object => "}",
        }
    }
}

/// Rendered value
#[derive(Clone, Debug, PartialEq)]
pub enum TreeNode {
    /// Primitive, holding its literal JSON text
    Leaf(String),
    /// `[]` or `{}`, never expandable
    Empty(Container),
    Branch { container: Container, rows: Vec<TreeRow> },
}

/// One child of a branch
#[derive(Clone, Debug, PartialEq)]
pub struct TreeRow {
    /// Object key; `None` for array items
    pub label: Option<String>,
    pub value: TreeNode,
    pub trailing_comma: bool,
    /// Present when `value` is a non-empty branch
    pub toggle: Option<Toggle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Toggle {
    pub expanded: bool,
}

/// Render a decoded value into a fully expanded tree
pub fn render(node: &JsonNode) -> TreeNode {
    match node {
        JsonNode::Null | JsonNode::Boolean(_) | JsonNode::Number(_) | JsonNode::String(_) => {
            TreeNode::Leaf(node.literal())
        }
        JsonNode::Array(items) if items.is_empty() => TreeNode::Empty(Container::Array),
        JsonNode::Object(members) if members.is_empty() => TreeNode::Empty(Container::Object),
        JsonNode::Array(items) => {
            let last = items.len() - 1;
            let rows = items
                .iter()
                .enumerate()
                .map(|(i, item)| render_row(None, item, i != last))
                .collect();
            TreeNode::Branch {
                container: Container::Array,
                rows,
            }
        }
        JsonNode::Object(members) => {
            let last = members.len() - 1;
            let rows = members
                .iter()
                .enumerate()
                .map(|(i, (key, value))| render_row(Some(key.clone()), value, i != last))
                .collect();
            TreeNode::Branch {
                container: Container::Object,
                rows,
            }
        }
    }
}

fn render_row(label: Option<String>, node: &JsonNode, trailing_comma: bool) -> TreeRow {
    let value = render(node);
    let toggle = matches!(value, TreeNode::Branch { .. }).then_some(Toggle { expanded: true });
    TreeRow {
        label,
        value,
        trailing_comma,
        toggle,
    }
}

impl TreeRow {
    pub fn is_expanded(&self) -> bool {
        self.toggle.map(|t| t.expanded).unwrap_or(false)
    }

    /// This row's value as indented JSON, regardless of collapse state
    pub fn copy_text(&self) -> String {
        self.value.copy_text()
    }
}

impl TreeNode {
    pub fn rows(&self) -> &[TreeRow] {
        match self {
            TreeNode::Branch { rows, .. } => rows,
            _ => &[],
        }
    }

    fn rows_mut(&mut self) -> &mut [TreeRow] {
        match self {
            TreeNode::Branch { rows, .. } => rows,
            _ => &mut [],
        }
    }

    pub fn row(&self, path: &[usize]) -> Option<&TreeRow> {
        let (&first, rest) = path.split_first()?;
        let row = self.rows().get(first)?;
        if rest.is_empty() {
            Some(row)
        } else {
            row.value.row(rest)
        }
    }

    pub fn row_mut(&mut self, path: &[usize]) -> Option<&mut TreeRow> {
        let (&first, rest) = path.split_first()?;
        let row = self.rows_mut().get_mut(first)?;
        if rest.is_empty() {
            Some(row)
        } else {
            row.value.row_mut(rest)
        }
    }

    /// Flip one row. Siblings and descendants keep their own state.
    /// Returns false when the row has no toggle.
    pub fn toggle(&mut self, path: &[usize]) -> bool {
        match self.row_mut(path).and_then(|row| row.toggle.as_mut()) {
            Some(toggle) => {
                toggle.expanded = !toggle.expanded;
                true
            }
            None => false,
        }
    }

    pub fn set_expanded(&mut self, path: &[usize], expanded: bool) -> bool {
        match self.row_mut(path).and_then(|row| row.toggle.as_mut()) {
            Some(toggle) => {
                toggle.expanded = expanded;
                true
            }
            None => false,
        }
    }

    /// Expand or collapse every row in the tree
    pub fn set_all(&mut self, expanded: bool) {
        for row in self.rows_mut() {
            if let Some(toggle) = row.toggle.as_mut() {
                toggle.expanded = expanded;
            }
            row.value.set_all(expanded);
        }
    }

    /// Paths of every row, depth first
    pub fn row_paths(&self) -> Vec<Vec<usize>> {
        let mut paths = Vec::new();
        let mut path = Vec::new();
        collect_paths(self, &mut path, &mut paths);
        paths
    }

    /// Rebuild the JSON value this node was rendered from
    pub fn to_value(&self) -> Value {
        match self {
            TreeNode::Leaf(literal) => {
                serde_json::from_str(literal).unwrap_or_else(|_| Value::String(literal.clone()))
            }
            TreeNode::Empty(Container::Array) => Value::Array(Vec::new()),
            TreeNode::Empty(Container::Object) => Value::Object(Map::new()),
            TreeNode::Branch {
                container: Container::Array,
                rows,
            } => Value::Array(rows.iter().map(|r| r.value.to_value()).collect()),
            TreeNode::Branch {
                container: Container::Object,
                rows,
            } => Value::Object(
                rows.iter()
                    .map(|r| (r.label.clone().unwrap_or_default(), r.value.to_value()))
                    .collect(),
            ),
        }
    }

    pub fn copy_text(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_default()
    }

    /// Visible lines, honouring collapse state
    pub fn lines(&self) -> Vec<TreeLine> {
        let mut out = Vec::new();
        match self {
            TreeNode::Leaf(literal) => out.push(TreeLine::root(LineToken::Value(literal.clone()))),
            TreeNode::Empty(container) => out.push(TreeLine::root(LineToken::Empty(*container))),
            TreeNode::Branch { container, rows } => {
                out.push(TreeLine::root(LineToken::Open(*container)));
                let mut path = Vec::new();
                for (i, row) in rows.iter().enumerate() {
                    path.push(i);
                    push_row_lines(row, 1, &mut path, &mut out);
                    path.pop();
                }
                out.push(TreeLine::root(LineToken::Close(*container)));
            }
        }
        out
    }

    /// Visible text with two-space indentation and no collapse markers
    pub fn to_text(&self) -> String {
        self.lines()
            .iter()
            .map(TreeLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn collect_paths(node: &TreeNode, path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    for (i, row) in node.rows().iter().enumerate() {
        path.push(i);
        out.push(path.clone());
        collect_paths(&row.value, path, out);
        path.pop();
    }
}

fn push_row_lines(row: &TreeRow, depth: usize, path: &mut Vec<usize>, out: &mut Vec<TreeLine>) {
    let marker = match row.toggle {
        None => Marker::None,
        Some(Toggle { expanded: true }) => Marker::Expanded,
        Some(Toggle { expanded: false }) => Marker::Collapsed,
    };
    let head = |token: LineToken, comma: bool| TreeLine {
        depth,
        row: Some(path.clone()),
        marker,
        label: row.label.clone(),
        token,
        comma,
    };

    match &row.value {
        TreeNode::Leaf(literal) => out.push(head(LineToken::Value(literal.clone()), row.trailing_comma)),
        TreeNode::Empty(container) => out.push(head(LineToken::Empty(*container), row.trailing_comma)),
        TreeNode::Branch { container, rows } if row.is_expanded() => {
            out.push(head(LineToken::Open(*container), false));
            for (i, child) in rows.iter().enumerate() {
                path.push(i);
                push_row_lines(child, depth + 1, path, out);
                path.pop();
            }
            out.push(TreeLine {
                depth,
                row: Some(path.clone()),
                marker: Marker::None,
                label: None,
                token: LineToken::Close(*container),
                comma: row.trailing_comma,
            });
        }
        TreeNode::Branch { container, rows } => out.push(head(
            LineToken::Collapsed {
                container: *container,
                count: rows.len(),
            },
            row.trailing_comma,
        )),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    None,
    Expanded,
    Collapsed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineToken {
    Value(String),
    Empty(Container),
    Open(Container),
    Close(Container),
    Collapsed { container: Container, count: usize },
}

/// One visible line of the tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeLine {
    pub depth: usize,
    /// Row this line belongs to; `None` for the root value itself
    pub row: Option<Vec<usize>>,
    pub marker: Marker,
    pub label: Option<String>,
    pub token: LineToken,
    pub comma: bool,
}

impl TreeLine {
    fn root(token: LineToken) -> Self {
        TreeLine {
            depth: 0,
            row: None,
            marker: Marker::None,
            label: None,
            token,
            comma: false,
        }
    }

    /// True for the line that starts a row (not a closing bracket)
    pub fn is_row_head(&self) -> bool {
        self.row.is_some() && !matches!(self.token, LineToken::Close(_))
    }

    /// Quoted key prefix, e.g. `"name": `
    pub fn label_text(&self) -> Option<String> {
        self.label
            .as_ref()
            .map(|l| format!("{}: ", serde_json::to_string(l).unwrap_or_default()))
    }

    pub fn token_text(&self) -> String {
        match &self.token {
            LineToken::Value(literal) => literal.clone(),
            LineToken::Empty(c) => format!("{}{}", c.open(), c.close()),
            LineToken::Open(c) => c.open().to_string(),
            LineToken::Close(c) => c.close().to_string(),
            LineToken::Collapsed { container, .. } => format!("{}…{}", container.open(), container.close()),
        }
    }

    pub fn text(&self) -> String {
        format!(
            "{}{}{}{}",
            "  ".repeat(self.depth),
            self.label_text().unwrap_or_default(),
            self.token_text(),
            if self.comma { "," } else { "" }
        )
    }
}

/// How a response body is shown
#[derive(Clone, Debug, PartialEq)]
pub enum BodyView {
    Tree(TreeNode),
    /// Body is not JSON; shown verbatim
    Text(String),
}

impl BodyView {
    pub fn from_body(body: &str) -> BodyView {
        match JsonNode::parse(body) {
            Some(node) => BodyView::Tree(render(&node)),
            None => BodyView::Text(body.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixtures() -> Vec<Value> {
        vec![
            json!(null),
            json!(42),
            json!("text with \"quotes\" and \u{00e9}"),
            json!([]),
            json!({}),
            json!({"a": [1, 2, {"b": null}]}),
            json!({"z": 1, "a": {"nested": {"deep": [true, false, [], {}]}}, "m": [[1, [2, [3]]]]}),
            json!([{"id": 1, "tags": ["x", "y"]}, {"id": 2, "tags": []}, 3.5, "s"]),
        ]
    }

    #[test]
    fn test_nested_object_structure() {
        let node = JsonNode::parse(r#"{"a":[1,2,{"b":null}]}"#).unwrap();
        let tree = render(&node);
        assert_eq!(tree.rows().len(), 1);

        let a = tree.row(&[0]).unwrap();
        assert_eq!(a.label.as_deref(), Some("a"));
        assert!(a.is_expanded());
        assert_eq!(a.value.rows().len(), 3);

        let third = tree.row(&[0, 2]).unwrap();
        assert_eq!(third.label, None);
        assert!(!third.trailing_comma);
        let b = tree.row(&[0, 2, 0]).unwrap();
        assert_eq!(b.label.as_deref(), Some("b"));
        assert_eq!(b.value, TreeNode::Leaf("null".to_string()));
        assert_eq!(b.toggle, None);
    }

    #[test]
    fn test_keys_keep_source_order() {
        let node = JsonNode::parse(r#"{"zeta":1,"alpha":2,"mid":3}"#).unwrap();
        let tree = render(&node);
        let labels: Vec<&str> = tree.rows().iter().filter_map(|r| r.label.as_deref()).collect();
        assert_eq!(labels, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_empty_containers_are_inline_and_not_expandable() {
        let tree = render(&JsonNode::parse(r#"{"list":[],"map":{}}"#).unwrap());
        for row in tree.rows() {
            assert_eq!(row.toggle, None);
        }
        assert_eq!(tree.to_text(), "{\n  \"list\": [],\n  \"map\": {}\n}");
    }

    #[test]
    fn test_expanded_text_matches_pretty_printer() {
        for value in fixtures() {
            let tree = render(&JsonNode::from(value.clone()));
            assert_eq!(tree.to_text(), serde_json::to_string_pretty(&value).unwrap());
        }
    }

    #[test]
    fn test_collapse_then_expand_restores_rendering() {
        for value in fixtures() {
            let mut tree = render(&JsonNode::from(value));
            let original = tree.lines();

            tree.set_all(false);
            tree.set_all(true);
            assert_eq!(tree.lines(), original);

            for path in tree.row_paths() {
                tree.toggle(&path);
            }
            for path in tree.row_paths() {
                tree.set_expanded(&path, true);
            }
            assert_eq!(tree.lines(), original);
        }
    }

    #[test]
    fn test_collapse_hides_only_that_block() {
        let mut tree = render(&JsonNode::parse(r#"{"a":{"x":1},"b":{"y":2}}"#).unwrap());
        assert!(tree.toggle(&[0]));
        let text = tree.to_text();
        assert_eq!(text, "{\n  \"a\": {…},\n  \"b\": {\n    \"y\": 2\n  }\n}");
        let collapsed = tree.lines().into_iter().find(|l| l.marker == Marker::Collapsed).unwrap();
        assert_eq!(
            collapsed.token,
            LineToken::Collapsed {
                container: Container::Object,
                count: 1
            }
        );
        // Leaves cannot be toggled
        assert!(!tree.toggle(&[1, 0]));
        assert!(!tree.toggle(&[9]));
    }

    #[test]
    fn test_copy_matches_row_value_regardless_of_collapse() {
        for value in fixtures() {
            let node = JsonNode::from(value);
            let mut tree = render(&node);
            tree.set_all(false);
            for path in tree.row_paths() {
                let copied: Value = serde_json::from_str(&tree.row(&path).unwrap().copy_text()).unwrap();
                assert_eq!(copied, node.at(&path).unwrap().to_value(), "path {:?}", path);
            }
            let whole: Value = serde_json::from_str(&tree.copy_text()).unwrap();
            assert_eq!(whole, node.to_value());
        }
    }

    #[test]
    fn test_body_view_falls_back_to_text() {
        assert_eq!(BodyView::from_body("<html>nope</html>"), BodyView::Text("<html>nope</html>".into()));
        assert_eq!(BodyView::from_body(""), BodyView::Text(String::new()));
        assert!(matches!(BodyView::from_body(" [1] "), BodyView::Tree(_)));
    }
}
