//! `relay check`: build a manifest's classes and report what delegation generates.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::{bail, Context};
use relay_core::{parse_parameters, Class, ClassRef, Method, Runtime, Value, Visibility};
use relay_engine::{DelegationRequest, Delegator, MissingRequest, Prefix, ReservedNames};

use crate::manifest::{ClassDecl, DelegateDecl, Manifest, MethodDecl, MissingDecl, PrefixDecl};
use crate::output::{resolve_color_choice, StyledOutput};

/// What a line of the report describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedKind {
    /// A forwarding member
    Forwarder,
    /// A catch-all proxy
    Proxy,
}

/// One generated artifact
#[derive(Debug, Clone)]
pub struct Generated {
    /// Manifest name of the owner class
    pub owner: String,
    /// Forwarder or proxy
    pub kind: GeneratedKind,
    /// `name(shape) -> receiver.member [policy]`
    pub description: String,
}

impl fmt::Display for Generated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner, self.description)
    }
}

/// Result of applying a manifest
#[derive(Debug)]
pub struct CheckReport {
    /// Runtime holding the built classes
    pub runtime: Runtime,
    /// Generated artifacts, in declaration order
    pub generated: Vec<Generated>,
}

impl CheckReport {
    /// Number of generated forwarders
    pub fn forwarder_count(&self) -> usize {
        self.count(GeneratedKind::Forwarder)
    }

    /// Number of installed proxies
    pub fn proxy_count(&self) -> usize {
        self.count(GeneratedKind::Proxy)
    }

    fn count(&self, kind: GeneratedKind) -> usize {
        self.generated.iter().filter(|g| g.kind == kind).count()
    }
}

/// Check the manifest at `path` and print the report
pub fn execute(path: &Path, color: Option<&str>) -> anyhow::Result<()> {
    let manifest = Manifest::load(path)?;
    tracing::info!(
        manifest = %path.display(),
        classes = manifest.classes.len(),
        "checking manifest"
    );
    let report = run(&manifest)?;

    let mut out = StyledOutput::new(resolve_color_choice(color));
    if report.generated.is_empty() {
        out.warning("manifest declares no delegations");
    }
    for item in &report.generated {
        out.generated(item);
    }
    out.summary(&format!(
        "{} forwarder(s), {} catch-all proxy(ies)",
        report.forwarder_count(),
        report.proxy_count()
    ));
    out.flush();
    Ok(())
}

/// Build the manifest's classes and apply its declarations in order
pub fn run(manifest: &Manifest) -> anyhow::Result<CheckReport> {
    let runtime = Runtime::new();
    let classes = define_classes(&runtime, manifest)?;

    let reserved = manifest
        .reserved
        .iter()
        .fold(ReservedNames::default(), |set, word| set.with_word(word.clone()));

    let mut generated = Vec::new();
    {
        let delegator = Delegator::new(&runtime).with_reserved(reserved);
        for decl in &manifest.classes {
            let owner = &classes[&decl.name];
            apply_class(&delegator, decl, owner, &classes, &mut generated)?;
        }
    }

    Ok(CheckReport { runtime, generated })
}

fn apply_class(
    delegator: &Delegator<'_>,
    decl: &ClassDecl,
    owner: &ClassRef,
    classes: &HashMap<String, ClassRef>,
    generated: &mut Vec<Generated>,
) -> anyhow::Result<()> {
    for (i, delegate) in decl.delegations.iter().enumerate() {
        let context = || {
            format!(
                "{}: delegation #{} ({})",
                decl.name,
                i + 1,
                delegate.members.join(", ")
            )
        };
        let request = build_request(delegate, classes).with_context(context)?;
        let plan = delegator.plan(owner, request).with_context(context)?;
        generated.extend(plan.forwarders().iter().map(|forwarder| Generated {
            owner: decl.name.clone(),
            kind: GeneratedKind::Forwarder,
            description: forwarder.to_string(),
        }));
        plan.apply();
    }

    if let Some(missing) = &decl.missing {
        let proxy = delegator
            .delegate_missing_to(owner, missing_request(missing))
            .with_context(|| format!("{}: catch-all to `{}`", decl.name, missing.to))?;
        generated.push(Generated {
            owner: decl.name.clone(),
            kind: GeneratedKind::Proxy,
            description: proxy.to_string(),
        });
    }
    Ok(())
}

fn define_classes(rt: &Runtime, manifest: &Manifest) -> anyhow::Result<HashMap<String, ClassRef>> {
    let mut classes: HashMap<String, ClassRef> = HashMap::new();
    for decl in &manifest.classes {
        if classes.contains_key(&decl.name) {
            bail!("duplicate class `{}`", decl.name);
        }
        let mut class = if decl.anonymous {
            Class::anonymous()
        } else {
            Class::new(&decl.name)
        };
        if let Some(parent) = &decl.parent {
            let parent = lookup(&classes, parent)
                .with_context(|| format!("{}: parent must be declared first", decl.name))?;
            class = class.extends(parent);
        }
        for field in &decl.fields {
            class = class.with_method(field_reader(field));
        }
        for method in &decl.methods {
            class = class.with_method(stub(method).with_context(|| decl.name.clone())?);
        }
        for method in &decl.static_methods {
            class = class.with_static_method(stub(method).with_context(|| decl.name.clone())?);
        }
        classes.insert(decl.name.clone(), rt.define_class(class));
    }
    Ok(classes)
}

fn lookup<'a>(classes: &'a HashMap<String, ClassRef>, name: &str) -> anyhow::Result<&'a ClassRef> {
    classes
        .get(name)
        .with_context(|| format!("unknown class `{}`", name))
}

fn field_reader(field: &str) -> Method {
    let name = field.to_string();
    Method::new(field, vec![], move |_, this, _| {
        Ok(this
            .as_object()
            .and_then(|object| object.get_field(&name))
            .unwrap_or_default())
    })
}

fn stub(decl: &MethodDecl) -> anyhow::Result<Method> {
    let params = parse_parameters(&decl.params)
        .with_context(|| format!("method `{}`", decl.name))?;
    let visibility = if decl.private {
        Visibility::Private
    } else {
        Visibility::Public
    };
    Ok(Method::new(&decl.name, params, |_, _, _| Ok(Value::Null)).with_visibility(visibility))
}

fn build_request(
    decl: &DelegateDecl,
    classes: &HashMap<String, ClassRef>,
) -> anyhow::Result<DelegationRequest> {
    let mut request = DelegationRequest::new(decl.members.iter().cloned());
    match (&decl.to, &decl.to_class) {
        (Some(_), Some(_)) => bail!("give either `to` or `to_class`, not both"),
        (Some(expr), None) => request = request.to(expr.as_str()),
        (None, Some(name)) => request = request.to(lookup(classes, name)?),
        // Left for the engine to report.
        (None, None) => {}
    }

    let prefix = match &decl.prefix {
        PrefixDecl::Flag(flag) => Prefix::from(*flag),
        PrefixDecl::Name(name) => Prefix::from(name.as_str()),
    };
    request = request
        .prefix(prefix)
        .allow_null(decl.allow_null)
        .nullable(decl.nullable)
        .private(decl.private);

    if let Some(name) = &decl.as_class {
        request = request.as_class(lookup(classes, name)?);
    }
    if let Some(signature) = &decl.signature {
        request = request.signature(signature.as_str());
    }
    Ok(request)
}

fn missing_request(decl: &MissingDecl) -> MissingRequest {
    let mut request = MissingRequest::new(decl.to.as_str()).allow_null(decl.allow_null);
    if let Some(exclude) = &decl.exclude {
        request = exclude
            .iter()
            .fold(request.without_exclusions(), |request, name| request.exclude(name.as_str()));
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(text: &str) -> anyhow::Result<CheckReport> {
        run(&Manifest::parse(text)?)
    }

    #[test]
    fn test_report_lines() {
        let report = check(
            r#"
            [[class]]
            name = "Person"
            fields = ["name"]
            methods = [{ name = "greet", params = "other" }]

            [[class]]
            name = "Post"
            fields = ["person"]

            [[class.delegate]]
            members = ["name", "greet"]
            to = "person"
            as = "Person"
            prefix = true
            "#,
        )
        .unwrap();

        let lines: Vec<String> = report.generated.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            [
                "Post#person_name() -> person.name [guarded]",
                "Post#person_greet(other) -> person.greet [guarded]",
            ]
        );
        assert_eq!(report.forwarder_count(), 2);
    }

    #[test]
    fn test_parent_must_exist() {
        let err = check(
            r#"
            [[class]]
            name = "Child"
            parent = "Base"
            "#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("unknown class `Base`"));
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let err = check(
            r#"
            [[class]]
            name = "Post"
            fields = ["person"]
            [[class.delegate]]
            members = ["name"]
            to = "person"

            [[class]]
            name = "Post"
            "#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("duplicate class `Post`"));
    }

    #[test]
    fn test_to_and_to_class_conflict() {
        let err = check(
            r#"
            [[class]]
            name = "Config"

            [[class]]
            name = "App"
            [[class.delegate]]
            members = ["fetch"]
            to = "config"
            to_class = "Config"
            "#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("not both"));
    }

    #[test]
    fn test_custom_exclusions() {
        let report = check(
            r#"
            [[class]]
            name = "Wrapper"
            fields = ["inner"]
            [class.missing]
            to = "inner"
            exclude = ["to_json"]
            "#,
        )
        .unwrap();
        assert_eq!(report.proxy_count(), 1);
        assert_eq!(report.generated[0].to_string(), "Wrapper#* -> inner [guarded]");
    }
}
