use crate::RpcError;
use crate::constants::{CORE_ADD_STREAM, CORE_GET_SERVICES, CORE_REMOVE_STREAM, CORE_SERVICE};
use crate::rpc::{CallBuilder, PreparedCall, ResolveOnce};
use crate::schema::{
    DecodeSpec, MessageKind, Parameter, Procedure, ScalarKind, Service, ServiceCatalog,
    TypeDescriptor, Value,
};
use crate::wire::ProcedureCall;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use xxhash_rust::xxh3::xxh3_64;

/// Stable identifier for a (service, procedure) pair.
pub fn procedure_id(service: &str, procedure: &str) -> u64 {
    xxh3_64(format!("{}.{}", service, procedure).as_bytes())
}

/// One procedure compiled out of the catalog: the parameter descriptors for
/// the call-builder side and the decode spec for the result side.
#[derive(Debug, Clone)]
pub struct ProcedureBinding {
    pub service: String,
    pub procedure: String,
    pub parameters: Vec<Parameter>,
    pub return_spec: DecodeSpec,
}

impl ProcedureBinding {
    /// Builds a wire call from positional argument values, encoding each
    /// against its declared descriptor. Fails before any network I/O on an
    /// arity or shape mismatch.
    pub fn build_call(&self, args: &[Value]) -> Result<ProcedureCall, RpcError> {
        if args.len() != self.parameters.len() {
            return Err(RpcError::Arity {
                service: self.service.clone(),
                procedure: self.procedure.clone(),
                expected: self.parameters.len(),
                got: args.len(),
            });
        }
        let mut builder = CallBuilder::new(&self.service, &self.procedure);
        for (value, parameter) in args.iter().zip(&self.parameters) {
            builder = builder.argument(value, &parameter.descriptor)?;
        }
        Ok(builder.build())
    }

    /// Builds the call and pairs it with a clone of the return spec and the
    /// resolve callback, ready for `RpcDispatcher::send`.
    pub fn prepared(&self, args: &[Value], on_result: ResolveOnce) -> Result<PreparedCall, RpcError> {
        Ok(PreparedCall::new(
            self.build_call(args)?,
            self.return_spec.clone(),
            on_result,
        ))
    }
}

/// Per-class accessor maps, grouped at compile time from the
/// `Class_Method` / `Class_get_Property` / `Class_set_Property` naming
/// convention. Values are procedure ids into the owning [`BindingSet`].
#[derive(Debug, Clone, Default)]
pub struct ClassBindings {
    pub service: String,
    pub class: String,
    methods: HashMap<String, u64>,
    getters: HashMap<String, u64>,
    setters: HashMap<String, u64>,
}

impl ClassBindings {
    pub fn method(&self, name: &str) -> Option<u64> {
        self.methods.get(name).copied()
    }

    pub fn getter(&self, property: &str) -> Option<u64> {
        self.getters.get(property).copied()
    }

    pub fn setter(&self, property: &str) -> Option<u64> {
        self.setters.get(property).copied()
    }
}

enum ClassMember<'a> {
    Method(&'a str),
    Getter(&'a str),
    Setter(&'a str),
}

/// Splits `Class_Method` style names. Only uppercase-initial prefixes group
/// into classes, so plain procedures like `get_services` stay unaffected.
fn split_class_member(name: &str) -> Option<(&str, ClassMember<'_>)> {
    let (class, member) = name.split_once('_')?;
    if class.is_empty() || member.is_empty() {
        return None;
    }
    if !class.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        return None;
    }
    let member = match member.split_once('_') {
        Some(("get", property)) if !property.is_empty() => ClassMember::Getter(property),
        Some(("set", property)) if !property.is_empty() => ClassMember::Setter(property),
        _ => ClassMember::Method(member),
    };
    Some((class, member))
}

/// The compiled output of the binding generator: one entry per procedure,
/// plus per-class accessor maps.
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    procedures: HashMap<u64, ProcedureBinding>,
    classes: HashMap<String, ClassBindings>,
}

impl BindingSet {
    /// Pure compilation of a service catalog: for every procedure, a call
    /// builder plus a decode spec built by recursively walking the return
    /// descriptor. Runs once at startup; descriptors that fail to compile
    /// (depth, dictionary shape) reject the catalog.
    pub fn compile(catalog: &ServiceCatalog) -> Result<BindingSet, RpcError> {
        let mut set = BindingSet::default();

        for service in &catalog.services {
            for procedure in &service.procedures {
                let return_spec = match &procedure.return_type {
                    Some(descriptor) => DecodeSpec::build(descriptor)?,
                    None => DecodeSpec::Scalar(ScalarKind::None),
                };
                let id = procedure_id(&service.name, &procedure.name);
                set.procedures.insert(
                    id,
                    ProcedureBinding {
                        service: service.name.clone(),
                        procedure: procedure.name.clone(),
                        parameters: procedure.parameters.clone(),
                        return_spec,
                    },
                );

                if let Some((class, member)) = split_class_member(&procedure.name) {
                    let entry = set
                        .classes
                        .entry(format!("{}.{}", service.name, class))
                        .or_insert_with(|| ClassBindings {
                            service: service.name.clone(),
                            class: class.to_string(),
                            ..ClassBindings::default()
                        });
                    match member {
                        ClassMember::Method(name) => entry.methods.insert(name.to_string(), id),
                        ClassMember::Getter(name) => entry.getters.insert(name.to_string(), id),
                        ClassMember::Setter(name) => entry.setters.insert(name.to_string(), id),
                    };
                }
            }
        }

        tracing::debug!(
            procedures = set.procedures.len(),
            classes = set.classes.len(),
            "compiled service catalog"
        );
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    pub fn procedure(&self, service: &str, procedure: &str) -> Option<&ProcedureBinding> {
        self.procedures.get(&procedure_id(service, procedure))
    }

    pub fn procedure_by_id(&self, id: u64) -> Option<&ProcedureBinding> {
        self.procedures.get(&id)
    }

    pub fn class(&self, service: &str, class: &str) -> Option<&ClassBindings> {
        self.classes.get(&format!("{}.{}", service, class))
    }
}

/// Bindings for the built-in `core` service, compiled once.
pub fn core_bindings() -> &'static BindingSet {
    static CORE: Lazy<BindingSet> = Lazy::new(|| {
        let catalog = ServiceCatalog {
            services: vec![Service {
                name: CORE_SERVICE.to_string(),
                procedures: vec![
                    Procedure {
                        name: CORE_GET_SERVICES.to_string(),
                        parameters: vec![],
                        return_type: Some(TypeDescriptor::Message(MessageKind::Services)),
                    },
                    Procedure {
                        name: CORE_ADD_STREAM.to_string(),
                        parameters: vec![Parameter {
                            name: "call".to_string(),
                            descriptor: TypeDescriptor::Message(MessageKind::Call),
                        }],
                        return_type: Some(TypeDescriptor::Message(MessageKind::Stream)),
                    },
                    Procedure {
                        name: CORE_REMOVE_STREAM.to_string(),
                        parameters: vec![Parameter {
                            name: "id".to_string(),
                            descriptor: TypeDescriptor::Scalar(ScalarKind::UInt64),
                        }],
                        return_type: None,
                    },
                ],
            }],
        };
        BindingSet::compile(&catalog).expect("built-in catalog always compiles")
    });
    &CORE
}
