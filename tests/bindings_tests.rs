use wirecall::RpcError;
use wirecall::constants::{CORE_ADD_STREAM, CORE_GET_SERVICES, CORE_REMOVE_STREAM, CORE_SERVICE};
use wirecall::rpc::{BindingSet, core_bindings, procedure_id};
use wirecall::schema::{
    DecodeSpec, ObjectHandle, Parameter, Procedure, ScalarKind, Service, ServiceCatalog,
    TypeDescriptor, Value,
};

fn vessel_catalog() -> ServiceCatalog {
    let this_param = Parameter {
        name: "this".to_string(),
        descriptor: TypeDescriptor::class("orbit", "Vessel"),
    };
    ServiceCatalog {
        services: vec![Service {
            name: "orbit".to_string(),
            procedures: vec![
                Procedure {
                    name: "Vessel_get_Name".to_string(),
                    parameters: vec![this_param.clone()],
                    return_type: Some(TypeDescriptor::scalar(ScalarKind::String)),
                },
                Procedure {
                    name: "Vessel_set_Name".to_string(),
                    parameters: vec![
                        this_param.clone(),
                        Parameter {
                            name: "value".to_string(),
                            descriptor: TypeDescriptor::scalar(ScalarKind::String),
                        },
                    ],
                    return_type: None,
                },
                Procedure {
                    name: "Vessel_Launch".to_string(),
                    parameters: vec![this_param],
                    return_type: Some(TypeDescriptor::scalar(ScalarKind::Bool)),
                },
                Procedure {
                    name: "warp_to".to_string(),
                    parameters: vec![Parameter {
                        name: "ut".to_string(),
                        descriptor: TypeDescriptor::scalar(ScalarKind::Double),
                    }],
                    return_type: None,
                },
            ],
        }],
    }
}

#[test]
fn every_procedure_gets_a_binding_with_a_compiled_return_spec() {
    let bindings = BindingSet::compile(&vessel_catalog()).unwrap();
    assert_eq!(bindings.len(), 4);

    let getter = bindings.procedure("orbit", "Vessel_get_Name").unwrap();
    assert_eq!(getter.return_spec, DecodeSpec::Scalar(ScalarKind::String));

    // Procedures without a return type decode as none.
    let setter = bindings.procedure("orbit", "Vessel_set_Name").unwrap();
    assert_eq!(setter.return_spec, DecodeSpec::Scalar(ScalarKind::None));
}

#[test]
fn class_members_group_into_accessor_maps() {
    let bindings = BindingSet::compile(&vessel_catalog()).unwrap();
    let vessel = bindings.class("orbit", "Vessel").unwrap();

    assert_eq!(
        vessel.getter("Name"),
        Some(procedure_id("orbit", "Vessel_get_Name"))
    );
    assert_eq!(
        vessel.setter("Name"),
        Some(procedure_id("orbit", "Vessel_set_Name"))
    );
    assert_eq!(
        vessel.method("Launch"),
        Some(procedure_id("orbit", "Vessel_Launch"))
    );
    assert_eq!(vessel.method("Explode"), None);

    // Lowercase-prefixed names are plain procedures, not class members.
    assert!(bindings.class("orbit", "warp").is_none());
    assert!(bindings.procedure("orbit", "warp_to").is_some());
}

#[test]
fn build_call_assigns_sequential_positions() {
    let bindings = BindingSet::compile(&vessel_catalog()).unwrap();
    let setter = bindings.procedure("orbit", "Vessel_set_Name").unwrap();

    let call = setter
        .build_call(&[
            Value::Class(ObjectHandle(12)),
            Value::String("Kestrel".to_string()),
        ])
        .unwrap();

    assert_eq!(call.service, "orbit");
    assert_eq!(call.procedure, "Vessel_set_Name");
    assert_eq!(call.arguments.len(), 2);
    assert_eq!(call.arguments[0].position, 0);
    assert_eq!(call.arguments[1].position, 1);
    // Handle 12 encodes as a single-byte varint.
    assert_eq!(call.arguments[0].value, vec![12]);
}

#[test]
fn wrong_argument_count_fails_before_any_io() {
    let bindings = BindingSet::compile(&vessel_catalog()).unwrap();
    let launch = bindings.procedure("orbit", "Vessel_Launch").unwrap();

    let err = launch.build_call(&[]).unwrap_err();
    assert_eq!(
        err,
        RpcError::Arity {
            service: "orbit".to_string(),
            procedure: "Vessel_Launch".to_string(),
            expected: 1,
            got: 0,
        }
    );
}

#[test]
fn mismatched_argument_values_fail_before_any_io() {
    let bindings = BindingSet::compile(&vessel_catalog()).unwrap();
    let warp = bindings.procedure("orbit", "warp_to").unwrap();

    let err = warp.build_call(&[Value::String("soon".to_string())]).unwrap_err();
    assert!(matches!(err, RpcError::EncodeMismatch(_)));
}

#[test]
fn catalogs_with_over_deep_returns_fail_to_compile() {
    let mut descriptor = TypeDescriptor::scalar(ScalarKind::UInt32);
    for _ in 0..8 {
        descriptor = TypeDescriptor::list(descriptor);
    }
    let catalog = ServiceCatalog {
        services: vec![Service {
            name: "orbit".to_string(),
            procedures: vec![Procedure {
                name: "deep".to_string(),
                parameters: vec![],
                return_type: Some(descriptor),
            }],
        }],
    };
    assert!(matches!(
        BindingSet::compile(&catalog),
        Err(RpcError::SpecBuild(_))
    ));
}

#[test]
fn procedure_ids_are_stable_and_distinct() {
    assert_eq!(
        procedure_id("orbit", "warp_to"),
        procedure_id("orbit", "warp_to")
    );
    assert_ne!(
        procedure_id("orbit", "warp_to"),
        procedure_id("orbit", "warp_from")
    );
    assert_ne!(
        procedure_id("orbit", "warp_to"),
        procedure_id("core", "warp_to")
    );
}

#[test]
fn built_in_core_bindings_cover_the_stream_sub_protocol() {
    let bindings = core_bindings();

    let add = bindings.procedure(CORE_SERVICE, CORE_ADD_STREAM).unwrap();
    // A stream message decodes to the identifier it carries.
    assert_eq!(add.return_spec, DecodeSpec::Scalar(ScalarKind::UInt64));

    let remove = bindings.procedure(CORE_SERVICE, CORE_REMOVE_STREAM).unwrap();
    assert_eq!(remove.parameters.len(), 1);
    assert_eq!(remove.return_spec, DecodeSpec::Scalar(ScalarKind::None));

    let services = bindings.procedure(CORE_SERVICE, CORE_GET_SERVICES).unwrap();
    assert_eq!(services.return_spec, DecodeSpec::Opaque);
}
