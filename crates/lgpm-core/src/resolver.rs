use std::collections::HashMap;

use lgpm_schema::PackageName;

use crate::catalog::Catalog;

/// Result of expanding a set of requested packages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Install order: every dependency before its dependents, no duplicates.
    pub order: Vec<PackageName>,
    /// Requested names that are not in the catalog.
    pub missing: Vec<PackageName>,
    /// Everything that was skipped, in the order it was found.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Resolves dependencies for a set of packages and returns them in installation order.
///
/// Depth-first walk over each requested root in turn. A package is marked
/// `Visiting` before its dependencies are walked, and any package already
/// marked is never walked again, so a cycle `A -> B -> A` requested as `[A]`
/// resolves to `[B, A]`. Names absent from the catalog are skipped with a
/// warning and never abort resolution of their siblings.
pub fn resolve(requested: &[PackageName], catalog: &Catalog) -> Resolution {
    let mut resolution = Resolution::default();
    let mut marks = HashMap::new();

    for name in requested {
        if catalog.find(name).is_none() {
            if !resolution.missing.contains(name) {
                let msg = format!("Package '{name}' not found in catalog");
                tracing::warn!("{msg}");
                resolution.warnings.push(msg);
                resolution.missing.push(name.clone());
            }
            continue;
        }
        visit(name, None, catalog, &mut marks, &mut resolution);
    }

    resolution
}

fn visit(
    name: &PackageName,
    parent: Option<&PackageName>,
    catalog: &Catalog,
    marks: &mut HashMap<PackageName, Mark>,
    resolution: &mut Resolution,
) {
    match marks.get(name) {
        Some(Mark::Done) => return,
        Some(Mark::Visiting) => {
            tracing::debug!("Dependency cycle through '{name}', not descending again");
            return;
        }
        None => {}
    }

    let Some(record) = catalog.find(name) else {
        let msg = match parent {
            Some(parent) => format!("Dependency '{name}' of '{parent}' not found in catalog"),
            None => format!("Package '{name}' not found in catalog"),
        };
        tracing::warn!("{msg}");
        resolution.warnings.push(msg);
        marks.insert(name.clone(), Mark::Done);
        return;
    };

    marks.insert(name.clone(), Mark::Visiting);
    for dep in &record.dependencies {
        visit(dep, Some(name), catalog, marks, resolution);
    }
    marks.insert(name.clone(), Mark::Done);

    resolution.order.push(name.clone());
}
