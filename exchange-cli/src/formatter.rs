use colored::*;
use exchange_client::{
    CallError,
    prost_reflect::{Kind, MessageDescriptor, MethodDescriptor, ServiceDescriptor},
};
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct ServiceList(pub Vec<ServiceDescriptor>);

pub struct GenericError<T: Display>(pub &'static str, pub T);

/// An engine answer with `success == false`.
pub struct Rejected<'a>(pub &'a serde_json::Value);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<&CallError> for FormattedString {
    fn from(err: &CallError) -> Self {
        match err {
            CallError::Transport(err) => FormattedString(format!(
                "{} path={} code={:?} message={:?}",
                "gRPC Failed:".red().bold(),
                err.path(),
                err.code(),
                err.status().message()
            )),
            CallError::Codec(err) => {
                FormattedString(format!("{}\n\n'{}'", "Codec Error:".red().bold(), err))
            }
        }
    }
}

impl From<Rejected<'_>> for FormattedString {
    fn from(Rejected(response): Rejected<'_>) -> Self {
        let code = response
            .get("code")
            .and_then(serde_json::Value::as_str)
            .filter(|code| !code.is_empty())
            .unwrap_or("<no code>");

        FormattedString(format!(
            "{} code={}",
            "Rejected by the engine:".yellow().bold(),
            code
        ))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}

impl From<ServiceList> for FormattedString {
    fn from(ServiceList(services): ServiceList) -> Self {
        if services.is_empty() {
            return FormattedString("The schema declares no services.".yellow().to_string());
        }

        let lines: Vec<String> = services
            .iter()
            .map(|svc| {
                format!(
                    "  - {} ({} methods)",
                    svc.full_name().green(),
                    svc.methods().count()
                )
            })
            .collect();

        FormattedString(format!("Services:\n{}", lines.join("\n")))
    }
}

impl From<ServiceDescriptor> for FormattedString {
    fn from(service: ServiceDescriptor) -> Self {
        let methods: Vec<String> = service
            .methods()
            .map(|method| format!("  {}", FormattedString::from(method).0))
            .collect();

        FormattedString(format!(
            "{} {} {{\n{}\n}}",
            "service".cyan(),
            service.name().green(),
            methods.join("\n")
        ))
    }
}

impl From<MethodDescriptor> for FormattedString {
    fn from(method: MethodDescriptor) -> Self {
        let stream = |streaming: bool| {
            if streaming {
                format!("{} ", "stream".cyan())
            } else {
                String::new()
            }
        };

        FormattedString(format!(
            "{} {}({}{}) {} ({}{});",
            "rpc".cyan(),
            method.name().green(),
            stream(method.is_client_streaming()),
            method.input().full_name().yellow(),
            "returns".cyan(),
            stream(method.is_server_streaming()),
            method.output().full_name().yellow()
        ))
    }
}

impl From<MessageDescriptor> for FormattedString {
    fn from(message: MessageDescriptor) -> Self {
        let fields: Vec<String> = message
            .fields()
            .map(|field| {
                let repeated = if field.is_list() { "repeated " } else { "" };
                format!(
                    "  {}{} {} = {};",
                    repeated.cyan(),
                    kind_name(&field.kind()).yellow(),
                    field.name(),
                    field.number()
                )
            })
            .collect();

        FormattedString(format!(
            "{} {} {{\n{}\n}}",
            "message".cyan(),
            message.name().green(),
            fields.join("\n")
        ))
    }
}

/// The proto spelling of a field type. Map fields render as their entry message.
fn kind_name(kind: &Kind) -> String {
    match kind {
        Kind::Message(m) => m.full_name().to_string(),
        Kind::Enum(e) => e.full_name().to_string(),
        scalar => format!("{scalar:?}").to_lowercase(),
    }
}
