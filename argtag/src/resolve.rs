/*!
The resolver: environment fallbacks, defaults, required fields and
exclusivity groups. It runs once for each command on the active path,
starting from the leaf.
 */

use std::collections::HashMap;

use tracing::debug;

use crate::{
    Config,
    dispatch::{Origin, ParseState, assign, invalid, record_at},
    error::Error,
    metadata::FieldSpec,
    record::{Record, Shape, Store},
};

impl ParseState<'_> {
    pub fn resolve(&mut self, root: &mut dyn Record, config: &Config) -> Result<(), Error> {
        for depth in (0..self.frames.len()).rev() {
            let record = record_at(root, &self.frames, depth)?;
            let spec = self.frames[depth].spec;
            let origins = &mut self.frames[depth].origins;

            for field in spec.fields() {
                fill(record, field, &mut origins[field.index], config)?;
            }

            check_required(record, spec.fields(), origins)?;
            check_groups(spec.fields(), origins)?;
        }

        Ok(())
    }
}

/// Apply the environment and default stages to a single field
fn fill(
    record: &mut dyn Record,
    field: &FieldSpec,
    origin: &mut Origin,
    config: &Config,
) -> Result<(), Error> {
    if *origin != Origin::Unset || !record.is_zero(field.index) {
        return Ok(());
    }

    if !config.ignore_env
        && let Some(ref var) = field.env
        && let Some(value) = config.lookup_env(var)
    {
        debug!(field = field.name, var = %var, "using environment variable");

        let env_error = |err| Error::InvalidValue {
            option: format!("{} (environment variable {var})", field.display_name()),
            value: value.clone(),
            reason: err,
        };

        match field.shape {
            Shape::Slice => {
                let mut store = Store::Replace;

                for item in value.split(',').map(str::trim).filter(|item| !item.is_empty()) {
                    assign(record, field, item, store).map_err(env_error)?;
                    store = Store::Append;
                }

                if store == Store::Append {
                    *origin = Origin::Env;
                }
            }
            Shape::Single | Shape::Optional => {
                assign(record, field, &value, Store::Replace).map_err(env_error)?;
                *origin = Origin::Env;
            }
        }

        if *origin == Origin::Env {
            return Ok(());
        }
    }

    if !config.ignore_default
        && let Some(default) = field.default
    {
        debug!(field = field.name, default, "using default");

        assign(record, field, default, Store::Replace).map_err(|err| invalid(field, default, err))?;
        *origin = Origin::Default;
    }

    Ok(())
}

fn check_required<'a>(
    record: &dyn Record,
    fields: impl IntoIterator<Item = &'a FieldSpec>,
    origins: &[Origin],
) -> Result<(), Error> {
    match fields
        .into_iter()
        .filter(|field| field.required)
        .find(|field| !origins[field.index].is_explicit() && record.is_zero(field.index))
    {
        None => Ok(()),
        Some(field) => Err(Error::MissingRequired {
            option: field.display_name(),
            env: field.env.clone(),
        }),
    }
}

fn check_groups<'a>(
    fields: impl IntoIterator<Item = &'a FieldSpec>,
    origins: &[Origin],
) -> Result<(), Error> {
    let mut seen: HashMap<&str, &FieldSpec> = HashMap::new();

    for field in fields {
        let Some(group) = field.group else { continue };

        if !origins[field.index].is_explicit() {
            continue;
        }

        if let Some(first) = seen.insert(group, field) {
            return Err(Error::Conflict {
                first: first.display_name(),
                second: field.display_name(),
            });
        }
    }

    Ok(())
}
