use crate::utils::error::{AegisError, Result};
use serde_json::Value;

/// Row-major f32 tensor passed between the service and the model adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(AegisError::invalid_input(format!(
                "cannot reshape array of size {} into shape {}",
                data.len(),
                format_shape(&shape)
            )));
        }
        Ok(Self { shape, data })
    }

    /// 將任意巢狀的數值 JSON 陣列攤平成張量 (row-major)。
    /// 非數值元素或不規則的巢狀結構會回傳錯誤。
    pub fn from_nested_json(value: &Value) -> Result<Self> {
        let mut data = Vec::new();
        let shape = flatten_into(value, &mut data)?;
        Ok(Self { shape, data })
    }

    pub fn reshape(self, shape: Vec<usize>) -> Result<Self> {
        Self::new(shape, self.data)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// 第一列 (batch 中的第一筆) 的數值
    pub fn first_row(&self) -> &[f32] {
        match self.shape.len() {
            0 | 1 => &self.data,
            _ => {
                let row_len: usize = self.shape[1..].iter().product();
                &self.data[..row_len.min(self.data.len())]
            }
        }
    }
}

fn flatten_into(value: &Value, out: &mut Vec<f32>) -> Result<Vec<usize>> {
    match value {
        Value::Number(n) => {
            let v = n
                .as_f64()
                .ok_or_else(|| AegisError::invalid_input(format!("unsupported number: {}", n)))?;
            out.push(v as f32);
            Ok(Vec::new())
        }
        Value::Array(items) => {
            let mut inner: Option<Vec<usize>> = None;
            for item in items {
                let shape = flatten_into(item, out)?;
                match &inner {
                    None => inner = Some(shape),
                    Some(expected) if *expected != shape => {
                        return Err(AegisError::invalid_input(format!(
                            "inhomogeneous array: expected element shape {}, got {}",
                            format_shape(expected),
                            format_shape(&shape)
                        )));
                    }
                    Some(_) => {}
                }
            }
            let mut shape = vec![items.len()];
            shape.extend(inner.unwrap_or_default());
            Ok(shape)
        }
        other => Err(AegisError::invalid_input(format!(
            "expected numeric data, found {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn format_shape(shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    if dims.len() == 1 {
        format!("({},)", dims[0])
    } else {
        format!("({})", dims.join(", "))
    }
}

/// 最大值的索引；相同最大值取最小索引。
/// NaN 視為最大值，回傳第一個 NaN 的索引 (與 numpy.argmax 相同)。
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            return Some(i);
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
