use crate::codec::{ByteReader, ByteWriter};
use crate::schema::TypeDescriptor;
use crate::wire::MalformedFrameError;

/// A procedure parameter as reported by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub descriptor: TypeDescriptor,
}

/// One remotely callable procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct Procedure {
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// Absent for procedures that return nothing.
    pub return_type: Option<TypeDescriptor>,
}

/// One service: a named group of procedures.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    pub procedures: Vec<Procedure>,
}

/// The server-reported catalog the binding generator consumes.
///
/// The catalog travels as the opaque payload of a `Services` envelope
/// message; this codec is symmetric so test peers can produce catalogs the
/// same way the client parses them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceCatalog {
    pub services: Vec<Service>,
}

impl ServiceCatalog {
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_uvarint(self.services.len() as u64);
        for service in &self.services {
            w.put_string(&service.name);
            w.put_uvarint(service.procedures.len() as u64);
            for procedure in &service.procedures {
                w.put_string(&procedure.name);
                w.put_uvarint(procedure.parameters.len() as u64);
                for parameter in &procedure.parameters {
                    w.put_string(&parameter.name);
                    parameter.descriptor.encode(&mut w);
                }
                match &procedure.return_type {
                    Some(descriptor) => {
                        w.put_u8(1);
                        descriptor.encode(&mut w);
                    }
                    None => w.put_u8(0),
                }
            }
        }
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MalformedFrameError> {
        let mut r = ByteReader::new(bytes);
        let service_count = r.read_len_prefix()?;
        let mut services = Vec::with_capacity(service_count.min(1024));
        for _ in 0..service_count {
            let name = r.read_string()?;
            let procedure_count = r.read_len_prefix()?;
            let mut procedures = Vec::with_capacity(procedure_count.min(1024));
            for _ in 0..procedure_count {
                let procedure_name = r.read_string()?;
                let parameter_count = r.read_len_prefix()?;
                let mut parameters = Vec::with_capacity(parameter_count.min(1024));
                for _ in 0..parameter_count {
                    parameters.push(Parameter {
                        name: r.read_string()?,
                        descriptor: TypeDescriptor::decode(&mut r)?,
                    });
                }
                let return_type = match r.read_u8()? {
                    0 => None,
                    1 => Some(TypeDescriptor::decode(&mut r)?),
                    flag => return Err(MalformedFrameError::UnknownFlags(flag)),
                };
                procedures.push(Procedure {
                    name: procedure_name,
                    parameters,
                    return_type,
                });
            }
            services.push(Service { name, procedures });
        }
        r.expect_end()?;
        Ok(ServiceCatalog { services })
    }
}

impl Service {
    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.name == name)
    }
}
