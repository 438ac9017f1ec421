//! REST framework sources: serializers, viewsets and URL routing.

use ue_core::naming::to_snake_case;
use ue_core::TableDescriptor;

use crate::emitter::{finish, is_read_only, Emitter};
use crate::fields::py_str;

fn model_list(tables: &[&TableDescriptor], suffix: &str) -> String {
    tables
        .iter()
        .map(|t| format!("{}{suffix}", t.model_name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders `serializers.py`.
pub(crate) fn render_serializers(module: &str, tables: &[&TableDescriptor]) -> String {
    let mut lines = vec![
        format!("\"\"\"Serializers for the {module} module.\"\"\""),
        String::new(),
        "from rest_framework import serializers".to_owned(),
        String::new(),
        format!("from .models import {}", model_list(tables, "")),
    ];

    for table in tables {
        let mut read_only = vec![py_str("id")];
        read_only.extend(
            table
                .emittable_columns()
                .filter(|c| is_read_only(c))
                .map(|c| py_str(&c.name)),
        );

        lines.push(String::new());
        lines.push(String::new());
        lines.push(format!(
            "class {}Serializer(serializers.ModelSerializer):",
            table.model_name
        ));
        lines.push("    class Meta:".to_owned());
        lines.push(format!("        model = {}", table.model_name));
        lines.push("        fields = '__all__'".to_owned());
        lines.push(format!("        read_only_fields = [{}]", read_only.join(", ")));
    }
    finish(&lines)
}

/// Renders `views.py`.
///
/// Tenant-scoped viewsets filter by the requesting user's organization.
pub(crate) fn render_views(emitter: &Emitter<'_>, module: &str, tables: &[&TableDescriptor]) -> String {
    let tenant_field = &emitter.config().tenant_field;
    let mut lines = vec![
        format!("\"\"\"API views for the {module} module.\"\"\""),
        String::new(),
        "from rest_framework import permissions, viewsets".to_owned(),
        String::new(),
        format!("from .models import {}", model_list(tables, "")),
        format!("from .serializers import {}", model_list(tables, "Serializer")),
    ];

    for table in tables {
        let model = &table.model_name;
        lines.push(String::new());
        lines.push(String::new());
        lines.push(format!("class {model}ViewSet(viewsets.ModelViewSet):"));
        lines.push(format!("    queryset = {model}.objects.all()"));
        lines.push(format!("    serializer_class = {model}Serializer"));
        lines.push("    permission_classes = [permissions.IsAuthenticated]".to_owned());
        if emitter.is_tenant(table) {
            lines.push(String::new());
            lines.push("    def get_queryset(self):".to_owned());
            lines.push(format!(
                "        return super().get_queryset().filter({tenant_field}=self.request.user.{tenant_field})"
            ));
            lines.push(String::new());
            lines.push("    def perform_create(self, serializer):".to_owned());
            lines.push(format!(
                "        serializer.save({tenant_field}=self.request.user.{tenant_field})"
            ));
        }
    }
    finish(&lines)
}

/// Renders `urls.py`.
pub(crate) fn render_urls(module: &str, tables: &[&TableDescriptor]) -> String {
    let mut lines = vec![
        format!("\"\"\"URL routes for the {module} module.\"\"\""),
        String::new(),
        "from django.urls import include, path".to_owned(),
        "from rest_framework.routers import DefaultRouter".to_owned(),
        String::new(),
        "from . import views".to_owned(),
        String::new(),
        "router = DefaultRouter()".to_owned(),
    ];
    for table in tables {
        lines.push(format!(
            "router.register(r{}, views.{}ViewSet, basename={})",
            py_str(&table.table_name.replace('_', "-")),
            table.model_name,
            py_str(&to_snake_case(&table.model_name).replace('_', "-")),
        ));
    }
    lines.push(String::new());
    lines.push("urlpatterns = [".to_owned());
    lines.push("    path('', include(router.urls)),".to_owned());
    lines.push("]".to_owned());
    finish(&lines)
}
