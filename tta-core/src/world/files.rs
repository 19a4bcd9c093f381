//! Project file tree: the rules, specs and skill sources the engine reads.
//!
//! Files are not part of world snapshots. Their content is flattened into
//! the `fileContext` of every engine request.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Folder,
}

/// A file or folder in the project tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
    #[serde(default)]
    pub is_open: bool,
}

impl FileNode {
    pub fn file(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: FileKind::File,
            content: Some(content.into()),
            children: Vec::new(),
            is_open: false,
        }
    }

    pub fn folder(id: impl Into<String>, name: impl Into<String>, children: Vec<FileNode>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: FileKind::Folder,
            content: None,
            children,
            is_open: true,
        }
    }

    fn find(&self, id: &str) -> Option<&FileNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut FileNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    fn walk<'a>(&'a self, depth: usize, out: &mut Vec<(usize, &'a FileNode)>) {
        out.push((depth, self));
        for child in &self.children {
            child.walk(depth + 1, out);
        }
    }
}

/// The whole project tree (several roots).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFiles {
    roots: Vec<FileNode>,
}

impl ProjectFiles {
    pub fn new(roots: Vec<FileNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[FileNode] {
        &self.roots
    }

    pub fn find(&self, id: &str) -> Option<&FileNode> {
        self.roots.iter().find_map(|r| r.find(id))
    }

    /// Replace the content of a file. Returns `false` if `id` is not a file.
    pub fn save(&mut self, id: &str, content: impl Into<String>) -> bool {
        match self.roots.iter_mut().find_map(|r| r.find_mut(id)) {
            Some(node) if node.kind == FileKind::File => {
                node.content = Some(content.into());
                true
            }
            _ => false,
        }
    }

    /// Depth-first listing with nesting depth, for tree displays.
    pub fn outline(&self) -> Vec<(usize, &FileNode)> {
        let mut out = Vec::new();
        for root in &self.roots {
            root.walk(0, &mut out);
        }
        out
    }

    /// All file contents concatenated in tree order, each wrapped in
    /// start/end markers naming the file.
    pub fn context(&self) -> String {
        let mut output = String::new();
        for (_, node) in self.outline() {
            if node.kind != FileKind::File {
                continue;
            }
            if let Some(content) = node.content.as_deref().filter(|c| !c.is_empty()) {
                output.push_str(&format!(
                    "\n--- START OF FILE {name} ---\n{content}\n--- END OF FILE {name} ---\n",
                    name = node.name
                ));
            }
        }
        output
    }
}
