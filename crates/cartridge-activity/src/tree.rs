// SPDX-License-Identifier: MIT OR Apache-2.0

//! Arena activity tree built from a manifest's organizations.
//!
//! Nodes live in a single vector; parent and child links are indices, so
//! the tree is one contiguous allocation with no ownership cycles.

use cartridge_error::ParseError;
use cartridge_scorm::scorm2004::{Scorm2004Item, Scorm2004Manifest};
use cartridge_scorm::sequencing::Sequencing;
use serde::{Deserialize, Serialize};

/// One node of the activity tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityNode {
    /// Identifier of the item (or organization, for the root).
    pub id: String,
    /// Display title, when declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Identifier of the referenced resource; `None` on containers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_identifier: Option<String>,
    /// Index of the parent node; `None` on the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    /// Indices of the children, in document order.
    pub children: Vec<usize>,
    /// Effective sequencing: inline, collection-resolved, or inherited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequencing: Option<Sequencing>,
    /// `isvisible` with its schema default applied.
    pub visible: bool,
}

/// The arena of activity nodes. Index 0 is the root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityTree {
    /// All nodes, root first, children in document order.
    pub nodes: Vec<ActivityNode>,
}

impl ActivityTree {
    /// Build the tree from the manifest's default (or first) organization.
    ///
    /// Effective sequencing resolves in this order: inline block with
    /// content; `IDRef` into the sequencing collection; nearest ancestor's
    /// effective sequencing; nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::DuplicateIdentifier`] when an item identifier
    /// reappears along the path from the root.
    pub fn build(manifest: &Scorm2004Manifest) -> Result<Self, ParseError> {
        let Some(org) = manifest.organizations.effective_default() else {
            return Ok(Self::default());
        };

        let mut tree = Self { nodes: Vec::new() };
        tree.nodes.push(ActivityNode {
            id: org.identifier.clone(),
            title: org.title.clone(),
            resource_identifier: None,
            parent: None,
            children: Vec::new(),
            sequencing: None,
            visible: true,
        });

        let mut path: Vec<String> = vec![org.identifier.clone()];
        for item in &org.items {
            let child = tree.add_item(item, 0, manifest, &mut path)?;
            tree.nodes[0].children.push(child);
        }
        Ok(tree)
    }

    fn add_item(
        &mut self,
        item: &Scorm2004Item,
        parent: usize,
        manifest: &Scorm2004Manifest,
        path: &mut Vec<String>,
    ) -> Result<usize, ParseError> {
        if path.iter().any(|p| p == &item.identifier) {
            return Err(ParseError::DuplicateIdentifier {
                id: item.identifier.clone(),
                path: path.join("/"),
            });
        }

        let sequencing = effective_sequencing(item, parent, manifest, &self.nodes);
        let index = self.nodes.len();
        self.nodes.push(ActivityNode {
            id: item.identifier.clone(),
            title: item.title.clone(),
            resource_identifier: item.identifier_ref.clone(),
            parent: Some(parent),
            children: Vec::new(),
            sequencing,
            visible: item.is_visible.unwrap_or(true),
        });

        path.push(item.identifier.clone());
        for child in &item.items {
            let child_index = self.add_item(child, index, manifest, path)?;
            self.nodes[index].children.push(child_index);
        }
        path.pop();
        Ok(index)
    }

    /// The root node, when the tree is non-empty.
    #[must_use]
    pub fn root(&self) -> Option<&ActivityNode> {
        self.nodes.first()
    }

    /// Number of nodes, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` when no organization produced any node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in depth-first document order, the root excluded.
    pub fn items(&self) -> impl Iterator<Item = &ActivityNode> {
        self.nodes.iter().skip(1)
    }

    /// The first leaf node carrying a resource reference, in document
    /// order. This is the launchable entry point of the organization.
    #[must_use]
    pub fn first_launchable(&self) -> Option<&ActivityNode> {
        self.items()
            .find(|n| n.resource_identifier.is_some())
    }
}

fn effective_sequencing(
    item: &Scorm2004Item,
    parent: usize,
    manifest: &Scorm2004Manifest,
    nodes: &[ActivityNode],
) -> Option<Sequencing> {
    if let Some(seq) = &item.sequencing {
        if seq.has_content() {
            return Some(seq.clone());
        }
        if let Some(id_ref) = &seq.id_ref
            && let Some(entry) = manifest.collection_entry(id_ref)
        {
            return Some(entry.clone());
        }
    }
    // Inherit from the nearest ancestor that resolved one.
    let mut cursor = Some(parent);
    while let Some(index) = cursor {
        if let Some(seq) = &nodes[index].sequencing {
            return Some(seq.clone());
        }
        cursor = nodes[index].parent;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartridge_core::{CancellationToken, NoopParsingEventListener, ParseContext};
    use cartridge_fs::MemoryFileAccess;
    use cartridge_scorm::scorm2004::parse_scorm2004;

    fn manifest_from(xml: &str) -> Scorm2004Manifest {
        let fs = MemoryFileAccess::new().with_file("imsmanifest.xml", xml.as_bytes());
        let listener = NoopParsingEventListener;
        let cancel = CancellationToken::new();
        let mut ctx = ParseContext::new(&listener, &cancel);
        parse_scorm2004(&fs, &mut ctx).unwrap()
    }

    fn wrap(body: &str) -> String {
        format!(
            r#"<manifest identifier="m"
                xmlns="http://www.imsglobal.org/xsd/imscp_v1p1"
                xmlns:imsss="http://www.imsglobal.org/xsd/imsss">
                <organizations default="ORG">
                    <organization identifier="ORG">
                        <title>Org</title>
                        {body}
                    </organization>
                </organizations>
                <resources>
                    <resource identifier="R1" href="a.html"/>
                    <resource identifier="R2" href="b.html"/>
                </resources>
            </manifest>"#
        )
    }

    #[test]
    fn builds_in_document_order_with_index_links() {
        let manifest = manifest_from(&wrap(
            r#"<item identifier="A">
                   <title>A</title>
                   <item identifier="A1" identifierref="R1"><title>A1</title></item>
                   <item identifier="A2" identifierref="R2"><title>A2</title></item>
               </item>
               <item identifier="B"><title>B</title></item>"#,
        ));
        let tree = ActivityTree::build(&manifest).unwrap();
        let ids: Vec<&str> = tree.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["ORG", "A", "A1", "A2", "B"]);
        assert_eq!(tree.nodes[0].children, vec![1, 4]);
        assert_eq!(tree.nodes[1].children, vec![2, 3]);
        assert_eq!(tree.nodes[2].parent, Some(1));
        assert_eq!(tree.nodes[4].parent, Some(0));
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.first_launchable().unwrap().id, "A1");
        assert!(tree.nodes[1].resource_identifier.is_none());
    }

    #[test]
    fn each_item_appears_exactly_once() {
        let manifest = manifest_from(&wrap(
            r#"<item identifier="A" identifierref="R1"><title>A</title></item>
               <item identifier="B" identifierref="R2"><title>B</title></item>"#,
        ));
        let tree = ActivityTree::build(&manifest).unwrap();
        assert_eq!(tree.items().count(), 2);
    }

    #[test]
    fn duplicate_identifier_along_path_is_rejected() {
        let manifest = manifest_from(&wrap(
            r#"<item identifier="A">
                   <title>A</title>
                   <item identifier="A" identifierref="R1"><title>inner</title></item>
               </item>"#,
        ));
        let err = ActivityTree::build(&manifest).unwrap_err();
        match err {
            ParseError::DuplicateIdentifier { id, path } => {
                assert_eq!(id, "A");
                assert_eq!(path, "ORG/A");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn sibling_duplicates_are_allowed() {
        // Only a repeat along the current path is a cycle.
        let manifest = manifest_from(&wrap(
            r#"<item identifier="A"><title>first</title></item>
               <item identifier="A"><title>second</title></item>"#,
        ));
        let tree = ActivityTree::build(&manifest).unwrap();
        assert_eq!(tree.items().count(), 2);
    }

    #[test]
    fn inline_sequencing_wins_and_children_inherit() {
        let manifest = manifest_from(&wrap(
            r#"<item identifier="A">
                   <title>A</title>
                   <imsss:sequencing>
                       <imsss:controlMode flow="true"/>
                   </imsss:sequencing>
                   <item identifier="A1" identifierref="R1"><title>A1</title></item>
               </item>"#,
        ));
        let tree = ActivityTree::build(&manifest).unwrap();
        let a = &tree.nodes[1];
        let a1 = &tree.nodes[2];
        assert!(a.sequencing.as_ref().unwrap().control_mode.is_some());
        // The child carries its ancestor's effective sequencing.
        assert_eq!(a1.sequencing, a.sequencing);
    }

    #[test]
    fn id_ref_resolves_through_the_collection() {
        let manifest = manifest_from(
            &wrap(
                r#"<item identifier="A" identifierref="R1">
                       <title>A</title>
                       <imsss:sequencing IDRef="shared"/>
                   </item>"#,
            )
            .replace(
                "</manifest>",
                r#"<imsss:sequencingCollection>
                       <imsss:sequencing ID="shared">
                           <imsss:controlMode forwardOnly="true"/>
                       </imsss:sequencing>
                   </imsss:sequencingCollection></manifest>"#,
            ),
        );
        let tree = ActivityTree::build(&manifest).unwrap();
        let seq = tree.nodes[1].sequencing.as_ref().unwrap();
        assert_eq!(
            seq.control_mode.as_ref().unwrap().forward_only,
            Some(true)
        );
    }

    #[test]
    fn empty_manifest_builds_an_empty_tree() {
        let manifest = manifest_from(
            r#"<manifest identifier="m" xmlns="http://www.imsglobal.org/xsd/imscp_v1p1">
                <organizations/>
                <resources/>
            </manifest>"#,
        );
        let tree = ActivityTree::build(&manifest).unwrap();
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
    }

    #[test]
    fn invisible_items_keep_their_flag() {
        let manifest = manifest_from(&wrap(
            r#"<item identifier="A" identifierref="R1" isvisible="false"><title>A</title></item>"#,
        ));
        let tree = ActivityTree::build(&manifest).unwrap();
        assert!(!tree.nodes[1].visible);
    }

    #[test]
    fn serde_roundtrip_preserves_structure() {
        let manifest = manifest_from(&wrap(
            r#"<item identifier="A" identifierref="R1"><title>A</title></item>"#,
        ));
        let tree = ActivityTree::build(&manifest).unwrap();
        let json = serde_json::to_string(&tree).unwrap();
        let back: ActivityTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
