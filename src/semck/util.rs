use std::collections::{HashMap, HashSet};

use crate::ast::{Enumerator, Field, Method};
use crate::diag::Span;
use crate::frontend::SourceFile;

use super::Context;

/// Named, span-carrying AST elements that the generic checks operate on.
pub trait Named {
    fn name(&self) -> &str;
    fn span(&self) -> Span;
}

/// Elements that additionally carry a wire id.
pub trait Numbered: Named {
    fn id(&self) -> u64;
}

impl Named for Field {
    fn name(&self) -> &str {
        &self.name
    }
    fn span(&self) -> Span {
        self.span
    }
}

impl Numbered for Field {
    fn id(&self) -> u64 {
        self.id
    }
}

impl Named for Enumerator {
    fn name(&self) -> &str {
        &self.name
    }
    fn span(&self) -> Span {
        self.span
    }
}

impl Named for Method {
    fn name(&self) -> &str {
        &self.name
    }
    fn span(&self) -> Span {
        self.span
    }
}

pub fn check_unique_names<N: Named>(
    ctx: &mut Context<'_>,
    nodes: &[N],
    file: &SourceFile,
    owner_label: &str,
    element_kind: &str,
) {
    let mut names = HashSet::new();
    for node in nodes {
        if !names.insert(node.name().to_string()) {
            ctx.report_error(
                file,
                node.span(),
                format!(
                    "Duplicate {element_kind} name '{}' in {owner_label}",
                    node.name()
                ),
            );
        }
    }
}

const MAX_ID: u64 = i32::MAX as u64;

fn check_id_bounds<N: Numbered>(
    ctx: &mut Context<'_>,
    node: &N,
    file: &SourceFile,
    element_kind: &str,
    owner_label: &str,
) {
    let id = node.id();
    if id == 0 {
        ctx.report_error(
            file,
            node.span(),
            format!("Invalid {element_kind} id '0' in {owner_label}; ids must start at 1"),
        );
        return;
    }
    if id > MAX_ID {
        ctx.report_error(
            file,
            node.span(),
            format!(
                "Invalid {element_kind} id '{id}' in {owner_label}; \
                 maximum allowed value is {MAX_ID}"
            ),
        );
    }
}

/// Validates the id set of one container: bounds, uniqueness, and a note
/// for each gap in sorted order.
pub fn check_id_collection<N: Numbered>(
    ctx: &mut Context<'_>,
    nodes: &[N],
    file: &SourceFile,
    owner_label: &str,
    element_kind: &str,
) {
    let mut seen: HashMap<u64, usize> = HashMap::new();
    for (index, node) in nodes.iter().enumerate() {
        check_id_bounds(ctx, node, file, element_kind, owner_label);
        if seen.insert(node.id(), index).is_some() {
            ctx.report_error(
                file,
                node.span(),
                format!(
                    "Duplicate {element_kind} id '{}' in {owner_label}",
                    node.id()
                ),
            );
        }
    }

    let mut ordered: Vec<&N> = nodes.iter().collect();
    ordered.sort_by_key(|node| node.id());
    for pair in ordered.windows(2) {
        let prev = pair[0].id();
        let current = pair[1].id();
        if current > prev + 1 {
            ctx.report_note(
                file,
                pair[1].span(),
                format!(
                    "Gap detected between {prev} and {current} for \
                     {element_kind} ids in {owner_label}"
                ),
            );
        }
    }
}
