// Display labels stored next to each sales bucket.

const MESES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// "Marzo" for a month, "Anual" for `(0, year)`, "Consolidado" for `(0, 0)`.
pub fn mes_label(mes: i32, anio: i32) -> String {
    match (mes, anio) {
        (0, 0) => "Consolidado".to_string(),
        (0, _) => "Anual".to_string(),
        (m, _) => usize::try_from(m - 1)
            .ok()
            .and_then(|idx| MESES.get(idx))
            .map(|name| name.to_string())
            .unwrap_or_else(|| format!("Mes {m}")),
    }
}
