// In-memory accumulation of sales buckets for one aggregation run.

use chrono_tz::Tz;
use mongodb::bson::oid::ObjectId;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    models::{CanalVenta, Destino, Documento, TipoEnvioTotal, Venta},
    periods,
};

use super::labels::mes_label;

/// Fallback label for missing channels and unnamed cities.
pub const DESCONOCIDO: &str = "Desconocido";

/// `(mes, anio)` of a bucket. `mes == 0` is a yearly rollup and `(0, 0)` the
/// consolidated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    pub anio: i32,
    pub mes: i32,
}

impl BucketKey {
    pub const CONSOLIDADO: BucketKey = BucketKey { anio: 0, mes: 0 };

    pub fn new(mes: i32, anio: i32) -> Self {
        BucketKey { anio, mes }
    }

    pub fn anual(anio: i32) -> Self {
        BucketKey { anio, mes: 0 }
    }

    /// The monthly, yearly and consolidated keys a document lands in.
    pub fn targets(mes: u32, anio: i32) -> [BucketKey; 3] {
        [
            BucketKey::new(mes as i32, anio),
            BucketKey::anual(anio),
            BucketKey::CONSOLIDADO,
        ]
    }

    pub fn label(&self) -> String {
        mes_label(self.mes, self.anio)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipoEnvio {
    Agencia,
    Domicilio,
    Desconocido,
}

impl TipoEnvio {
    /// Branch pickup wins over a bare city; neither means unknown.
    pub fn classify(documento: &Documento) -> Self {
        if documento.id_sucursal_destino.is_some() {
            TipoEnvio::Agencia
        } else if documento.id_ciudad_destino.is_some() {
            TipoEnvio::Domicilio
        } else {
            TipoEnvio::Desconocido
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TipoEnvio::Agencia => "Retiro en agencia",
            TipoEnvio::Domicilio => "Envios a domicilio",
            TipoEnvio::Desconocido => DESCONOCIDO,
        }
    }
}

/// Running totals of one bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketTotals {
    pub total_ventas: f64,
    pub total_envios: f64,
    pub ventas_envios: f64,
    pub envios: i64,
    pub clientes_atendidos: i64,
    pub pedidos: i64,
    pub principales_destinos: Vec<Destino>,
    pub agencia: i64,
    pub domicilio: i64,
    pub desconocido: i64,
    pub canales_venta: Vec<CanalVenta>,
}

impl BucketTotals {
    fn tally_destino(&mut self, destino: &str) {
        match self
            .principales_destinos
            .iter_mut()
            .find(|d| d.destino == destino)
        {
            Some(existing) => existing.total += 1,
            None => self.principales_destinos.push(Destino {
                destino: destino.to_string(),
                total: 1,
            }),
        }
    }

    fn tally_canal(&mut self, canal: &str, money: f64) {
        match self.canales_venta.iter_mut().find(|c| c.canal == canal) {
            Some(existing) => {
                existing.total += 1;
                existing.total_money += money;
            }
            None => self.canales_venta.push(CanalVenta {
                canal: canal.to_string(),
                total: 1,
                total_money: money,
            }),
        }
    }

    fn tally_tipo(&mut self, tipo: TipoEnvio) {
        match tipo {
            TipoEnvio::Agencia => self.agencia += 1,
            TipoEnvio::Domicilio => self.domicilio += 1,
            TipoEnvio::Desconocido => self.desconocido += 1,
        }
    }

    /// Always three rows, in agency / home / unknown order.
    pub fn tipos_envio(&self) -> Vec<TipoEnvioTotal> {
        [
            (TipoEnvio::Agencia, self.agencia),
            (TipoEnvio::Domicilio, self.domicilio),
            (TipoEnvio::Desconocido, self.desconocido),
        ]
        .into_iter()
        .map(|(tipo, total)| TipoEnvioTotal {
            tipo: tipo.label().to_string(),
            total,
        })
        .collect()
    }

    pub fn into_venta(self, key: BucketKey, clientes_nuevos: i64) -> Venta {
        let tipos_envio = self.tipos_envio();
        Venta {
            id: None,
            mes: key.mes,
            anio: key.anio,
            mes_label: key.label(),
            total_ventas: self.total_ventas,
            total_envios: self.total_envios,
            ventas_envios: self.ventas_envios,
            envios: self.envios,
            clientes_atendidos: self.clientes_atendidos,
            clientes_nuevos,
            pedidos: self.pedidos,
            principales_destinos: self.principales_destinos,
            tipos_envio,
            canales_venta: self.canales_venta,
        }
    }
}

/// Accumulation context for a single run; dropped when the run ends, so
/// distinct-client tracking never leaks between runs.
pub struct Aggregation {
    canal_excluido: String,
    timezone: Tz,
    buckets: BTreeMap<BucketKey, BucketTotals>,
    clientes_vistos: HashMap<BucketKey, HashSet<ObjectId>>,
}

impl Aggregation {
    pub fn new(canal_excluido: impl Into<String>, timezone: Tz) -> Self {
        Aggregation {
            canal_excluido: canal_excluido.into(),
            timezone,
            buckets: BTreeMap::new(),
            clientes_vistos: HashMap::new(),
        }
    }

    /// Adds one document to its three buckets. `destino` is the resolved
    /// city name and is only consulted when the document has a city.
    pub fn add(&mut self, documento: &Documento, destino: Option<&str>) {
        let (anio, mes) = periods::local_year_month(self.timezone, documento.fecha_emision.to_chrono());

        let canal = documento
            .canal_venta
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DESCONOCIDO);
        let cuenta_en_ventas = canal != self.canal_excluido;
        let destino = documento
            .id_ciudad_destino
            .map(|_| destino.filter(|d| !d.trim().is_empty()).unwrap_or(DESCONOCIDO));
        let tipo = TipoEnvio::classify(documento);

        for key in BucketKey::targets(mes, anio) {
            let bucket = self.buckets.entry(key).or_default();
            bucket.pedidos += 1;

            if let Some(cliente) = documento.id_cliente {
                if self.clientes_vistos.entry(key).or_default().insert(cliente) {
                    bucket.clientes_atendidos += 1;
                }
            }

            if cuenta_en_ventas {
                bucket.total_ventas += documento.total;
                bucket.total_envios += documento.costo_envio;
                bucket.ventas_envios += documento.total + documento.costo_envio;
                if documento.costo_envio != 0.0 {
                    bucket.envios += 1;
                }
            }

            if let Some(destino) = destino {
                bucket.tally_destino(destino);
            }
            bucket.tally_tipo(tipo);
            bucket.tally_canal(canal, documento.total);
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, key: &BucketKey) -> Option<&BucketTotals> {
        self.buckets.get(key)
    }

    /// Buckets in key order (consolidated, then each year's rollup and months).
    pub fn into_buckets(self) -> impl Iterator<Item = (BucketKey, BucketTotals)> {
        self.buckets.into_iter()
    }
}
