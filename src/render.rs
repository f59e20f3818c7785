// Copyright 2026 Abode Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use minijinja::AutoEscape;
use minijinja::Environment;
use minijinja::Value;
use minijinja::context;

use crate::error::Result;
use crate::model::CompositeRow;
use crate::path;
use crate::templates::TemplateStore;

/// Row template used when the response names its fields; cells are keyed by position.
const VALUES_ROW: &str = "<tr>{% for value in values %}<td>{{ value }}</td>{% endfor %}</tr>";

/// Left-pads to four characters with zeros, keeping the last four (`7` -> `0007`).
fn discrim(value: Value) -> String {
    let padded = format!("0000{value}");
    let skip = padded.chars().count().saturating_sub(4);
    padded.chars().skip(skip).collect()
}

pub struct RowRenderer {
    env: Environment<'static>,
    templates: TemplateStore,
}

impl RowRenderer {
    pub fn new(templates: TemplateStore) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_name: &str| AutoEscape::Html);
        env.add_filter("discrim", discrim);
        Self { env, templates }
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Renders one composite row.
    ///
    /// With `fields`, each dotted path is resolved against the row and the values are laid out
    /// in order; otherwise the row is handed whole to the template registered for `model`.
    pub fn render(
        &self,
        model: &str,
        row: &CompositeRow,
        fields: Option<&[String]>,
    ) -> Result<String> {
        match fields {
            Some(fields) => {
                let values: Vec<Option<&serde_json::Value>> = fields
                    .iter()
                    .map(|field| path::resolve_present(row.as_value(), field))
                    .collect();
                self.render_values(&values)
            }
            None => {
                let template = self.templates.get(model)?;
                let html = self.env.render_str(
                    template.body(),
                    context! { row => Value::from_serialize(row.as_value()) },
                )?;
                Ok(html)
            }
        }
    }

    /// Renders the positional row template. `None` cells render empty.
    pub fn render_values(&self, values: &[Option<&serde_json::Value>]) -> Result<String> {
        let cells: Vec<Value> = values
            .iter()
            .map(|value| match value {
                Some(value) => Value::from_serialize(value),
                None => Value::UNDEFINED,
            })
            .collect();
        let html = self.env.render_str(VALUES_ROW, context! { values => cells })?;
        Ok(html)
    }

    /// Renders every row, in order, and optionally wraps them in the named results template.
    ///
    /// Fails on the first row that cannot be rendered; no partial page is returned.
    pub fn render_page(
        &self,
        model: &str,
        rows: &[CompositeRow],
        fields: Option<&[String]>,
        wrapper: Option<&str>,
    ) -> Result<String> {
        let fragments = rows
            .iter()
            .map(|row| self.render(model, row, fields))
            .collect::<Result<Vec<_>>>()?;

        let Some(wrapper) = wrapper else {
            return Ok(fragments.concat());
        };

        let template = self.templates.get(wrapper)?;
        let rows: Vec<Value> = fragments.into_iter().map(Value::from_safe_string).collect();
        let html = self.env.render_str(
            template.body(),
            context! { model => model, fields => fields, rows => rows },
        )?;
        Ok(html)
    }
}
